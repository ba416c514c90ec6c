use std::sync::Mutex;

use actix_web::{HttpResponse, Responder, delete, get, post, web};
use serde::{Deserialize, Serialize};

use page_markov_core::{ModelError, NOT_FOUND, PrefetchStats, Prefetcher, state_index};

/// The one model served by this process. The core does no locking of its own.
pub type SharedPrefetcher = web::Data<Mutex<Prefetcher>>;

/// Body of `POST /v1/transitions`.
#[derive(Serialize, Deserialize)]
pub struct TransitionBody {
	pub from: i64,
	pub to: i64,
}

/// Body of `POST /v1/access`.
#[derive(Serialize, Deserialize)]
pub struct AccessBody {
	pub page: i64,
}

/// Query parameters of `GET /v1/predict`.
#[derive(Deserialize)]
struct PredictQuery {
	current: i64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct AccessResponse {
	/// Predicted next page, `-1` if none.
	pub predicted: i64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct PredictResponse {
	pub current: i64,
	/// Predicted next page, `-1` if none.
	pub predicted: i64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct StatsResponse {
	#[serde(flatten)]
	pub stats: PrefetchStats,
	pub hit_ratio: f64,
}

fn to_wire(page: Option<usize>) -> i64 {
	page.and_then(|p| i64::try_from(p).ok()).unwrap_or(NOT_FOUND)
}

fn bad_request(e: ModelError) -> HttpResponse {
	HttpResponse::BadRequest().body(e.to_string())
}

macro_rules! lock_or_500 {
	($data:expr) => {
		match $data.lock() {
			Ok(guard) => guard,
			Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
		}
	};
}

/// HTTP POST endpoint `/v1/transitions`
///
/// Records one observed transition. Replies 204, or 400 with the error text.
#[post("/v1/transitions")]
async fn post_transition(data: SharedPrefetcher, body: web::Json<TransitionBody>) -> impl Responder {
	let mut prefetcher = lock_or_500!(data);
	let size = prefetcher.model().size();

	let recorded = state_index(body.from, size)
		.and_then(|from| Ok((from, state_index(body.to, size)?)))
		.and_then(|(from, to)| prefetcher.record_transition(from, to));

	match recorded {
		Ok(()) => HttpResponse::NoContent().finish(),
		Err(e) => bad_request(e),
	}
}

/// HTTP POST endpoint `/v1/access`
///
/// Feeds one page access to the prefetcher and returns its next-page guess.
#[post("/v1/access")]
async fn post_access(data: SharedPrefetcher, body: web::Json<AccessBody>) -> impl Responder {
	let mut prefetcher = lock_or_500!(data);
	let size = prefetcher.model().size();

	match state_index(body.page, size).and_then(|page| prefetcher.access(page)) {
		Ok(predicted) => HttpResponse::Ok().json(AccessResponse { predicted: to_wire(predicted) }),
		Err(e) => bad_request(e),
	}
}

/// HTTP GET endpoint `/v1/predict?current=N`
#[get("/v1/predict")]
async fn get_predict(data: SharedPrefetcher, query: web::Query<PredictQuery>) -> impl Responder {
	let prefetcher = lock_or_500!(data);
	let model = prefetcher.model();

	match state_index(query.current, model.size()).and_then(|current| model.predict_next(current)) {
		Ok(predicted) => HttpResponse::Ok().json(PredictResponse {
			current: query.current,
			predicted: to_wire(predicted),
		}),
		Err(e) => bad_request(e),
	}
}

/// HTTP GET endpoint `/v1/matrix`
///
/// Plain-text dump of the matrix, two decimals per cell.
#[get("/v1/matrix")]
async fn get_matrix(data: SharedPrefetcher) -> impl Responder {
	let prefetcher = lock_or_500!(data);
	HttpResponse::Ok()
		.content_type("text/plain; charset=utf-8")
		.body(prefetcher.model().render())
}

#[get("/v1/stats")]
async fn get_stats(data: SharedPrefetcher) -> impl Responder {
	let prefetcher = lock_or_500!(data);
	let stats = prefetcher.stats();
	HttpResponse::Ok().json(StatsResponse { stats, hit_ratio: stats.hit_ratio() })
}

#[delete("/v1/model")]
async fn delete_model(data: SharedPrefetcher) -> impl Responder {
	let mut prefetcher = lock_or_500!(data);
	prefetcher.reset();
	HttpResponse::NoContent().finish()
}

/// Registers every endpoint on an app or scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(post_transition)
		.service(post_access)
		.service(get_predict)
		.service(get_matrix)
		.service(get_stats)
		.service(delete_model);
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::{App, test};

	fn shared(pages: usize) -> SharedPrefetcher {
		web::Data::new(Mutex::new(Prefetcher::new(pages).unwrap()))
	}

	fn record(from: i64, to: i64) -> test::TestRequest {
		test::TestRequest::post()
			.uri("/v1/transitions")
			.set_json(TransitionBody { from, to })
	}

	fn predict(current: i64) -> test::TestRequest {
		test::TestRequest::get().uri(&format!("/v1/predict?current={current}"))
	}

	#[actix_web::test]
	async fn walkthrough_over_http() {
		let app = test::init_service(App::new().app_data(shared(4)).configure(configure)).await;

		let resp: PredictResponse = test::call_and_read_body_json(&app, predict(1).to_request()).await;
		assert_eq!(resp, PredictResponse { current: 1, predicted: -1 });

		for (from, to) in [(0, 1), (0, 2), (1, 2), (1, 3), (2, 3), (3, 0)] {
			let resp = test::call_service(&app, record(from, to).to_request()).await;
			assert_eq!(resp.status(), StatusCode::NO_CONTENT);
		}
		let resp: PredictResponse = test::call_and_read_body_json(&app, predict(1).to_request()).await;
		assert_eq!(resp.predicted, 2);

		test::call_service(&app, record(1, 0).to_request()).await;
		test::call_service(&app, record(1, 0).to_request()).await;
		let resp: PredictResponse = test::call_and_read_body_json(&app, predict(1).to_request()).await;
		assert_eq!(resp.predicted, 0);

		let req = test::TestRequest::get().uri("/v1/matrix").to_request();
		let body = test::call_and_read_body(&app, req).await;
		let text = std::str::from_utf8(&body).unwrap();
		assert!(text.starts_with("0.00 0.50 0.50 0.00\n"));
		assert!(text.ends_with("\n\n"));
	}

	#[actix_web::test]
	async fn out_of_range_is_bad_request() {
		let data = shared(4);
		let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

		for (from, to) in [(-1, 0), (0, 4)] {
			let resp = test::call_service(&app, record(from, to).to_request()).await;
			assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
		}
		for current in [-1, 4] {
			let resp = test::call_service(&app, predict(current).to_request()).await;
			assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
		}

		let prefetcher = data.lock().unwrap();
		assert!(!(0..4).any(|page| prefetcher.model().is_observed(page).unwrap()));
	}

	#[actix_web::test]
	async fn access_stream_and_stats() {
		let app = test::init_service(App::new().app_data(shared(3)).configure(configure)).await;

		let mut last = AccessResponse { predicted: 0 };
		for page in [0, 1, 2, 0, 1] {
			let req = test::TestRequest::post()
				.uri("/v1/access")
				.set_json(AccessBody { page })
				.to_request();
			last = test::call_and_read_body_json(&app, req).await;
		}
		assert_eq!(last, AccessResponse { predicted: 2 });

		let req = test::TestRequest::get().uri("/v1/stats").to_request();
		let stats: StatsResponse = test::call_and_read_body_json(&app, req).await;
		assert_eq!(stats.stats.accesses, 5);
		assert_eq!(stats.stats.hits, 1);
		assert_eq!(stats.stats.misses, 0);
		assert!((stats.hit_ratio - 1.0).abs() < 1e-12);

		let req = test::TestRequest::delete().uri("/v1/model").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

		let req = test::TestRequest::get().uri("/v1/stats").to_request();
		let stats: StatsResponse = test::call_and_read_body_json(&app, req).await;
		assert_eq!(stats.stats, PrefetchStats::default());
	}
}
