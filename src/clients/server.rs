use std::io;

use actix_cors::Cors;
use actix_web::{
    http::{header::ContentType, StatusCode},
    middleware::{self, Condition},
    web::{self, Data},
    App, HttpResponse, HttpServer, ResponseError,
};

use crate::{
    consts::consts::MAX_PAYLOAD_BYTES,
    service::{
        guest_service::{GuestService, GuestServiceError},
        pagination::Pagination,
    },
};

type QueryParams = web::Query<Vec<(String, String)>>;

impl ResponseError for GuestServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            GuestServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GuestServiceError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GuestServiceError::Conflict(_) => StatusCode::CONFLICT,
            GuestServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        log::debug!("Rejected request: {}", self);

        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }
}

/// First value for `key`, repeated parameters after it are ignored
fn query_param<'a>(params: &'a QueryParams, key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

async fn register_guest(
    service: Data<GuestService>,
    body: web::Bytes,
) -> Result<HttpResponse, GuestServiceError> {
    let guest = service.register(&body)?;

    Ok(HttpResponse::Created().json(guest))
}

async fn list_guests(service: Data<GuestService>, params: QueryParams) -> HttpResponse {
    let pagination =
        Pagination::from_query(query_param(&params, "page"), query_param(&params, "limit"));

    HttpResponse::Ok().json(service.list(pagination))
}

async fn count_guests(service: Data<GuestService>) -> HttpResponse {
    HttpResponse::Ok().json(service.count())
}

async fn search_guests(
    service: Data<GuestService>,
    params: QueryParams,
) -> Result<HttpResponse, GuestServiceError> {
    let guests = service.search(query_param(&params, "name"))?;

    Ok(HttpResponse::Ok().json(guests))
}

async fn method_not_allowed() -> Result<HttpResponse, GuestServiceError> {
    Err(GuestServiceError::MethodNotAllowed)
}

/// Static route table, shared by the server and the tests. Only `/register`
/// checks the method, the read routes answer any method.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/register")
            .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
            .route(web::post().to(register_guest))
            .default_service(web::to(method_not_allowed)),
    )
    .service(web::resource("/guests").route(web::route().to(list_guests)))
    .service(web::resource("/guests/count").route(web::route().to(count_guests)))
    .service(web::resource("/guests/search").route(web::route().to(search_guests)));
}

pub struct ServerOptions {
    pub address: String,
    pub port: u16,
    pub log_http: bool,
    pub http_workers: usize,
}

pub struct Server {
    options: ServerOptions,
}

impl Server {
    pub fn new(options: ServerOptions) -> Self {
        Self { options }
    }

    /// Binds and serves until the process is stopped. Fails if the address
    /// cannot be bound.
    pub async fn run(self, guest_service: GuestService) -> io::Result<()> {
        let ServerOptions {
            address,
            port,
            log_http,
            http_workers,
        } = self.options;

        log::info!("Starting HTTP server on {}:{}", address, port);

        let guest_service = Data::new(guest_service);

        HttpServer::new(move || {
            App::new()
                .app_data(guest_service.clone())
                .configure(configure_routes)
                .wrap(Cors::permissive())
                .wrap(Condition::new(log_http, middleware::Logger::default()))
        })
        .workers(http_workers)
        .bind((address, port))?
        .run()
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::Method, test};
    use serde_json::{json, Value};

    use super::*;
    use crate::{
        model::guest::{Guest, GuestCount, GuestPage},
        storage::store::{
            test_utils::{new_test_store, ReadOnlyStorage},
            GuestStore, WriteMode,
        },
    };

    fn test_service() -> Data<GuestService> {
        Data::new(GuestService::new(Arc::new(new_test_store())))
    }

    macro_rules! test_app {
        ($service:expr) => {
            test::init_service(
                App::new()
                    .app_data($service.clone())
                    .configure(configure_routes),
            )
            .await
        };
    }

    fn register_request(body: Value) -> test::TestRequest {
        test::TestRequest::post().uri("/register").set_json(body)
    }

    #[actix_web::test]
    async fn register_then_duplicate_is_conflict() {
        let service = test_service();
        let app = test_app!(service);

        // Given a registered guest
        let response = test::call_service(
            &app,
            register_request(json!({
                "firstName": "John",
                "lastName": "Doe",
                "email": "john.doe@example.com"
            }))
            .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let created: Guest = test::read_body_json(response).await;
        assert_eq!(created, Guest::new_test());

        // When the same identity is registered in different case
        let response = test::call_service(
            &app,
            register_request(json!({
                "firstName": "john",
                "lastName": "DOE",
                "email": "JOHN.DOE@EXAMPLE.COM"
            }))
            .to_request(),
        )
        .await;

        // Then it conflicts with a plain text message
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = test::read_body(response).await;
        assert_eq!(body, "A guest with the same name and email already exists");
    }

    #[actix_web::test]
    async fn register_rejects_invalid_email() {
        let service = test_service();
        let app = test_app!(service);

        let response = test::call_service(
            &app,
            register_request(json!({
                "firstName": "Jane",
                "lastName": "Doe",
                "email": "jane.doe@invalid"
            }))
            .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = test::read_body(response).await;
        assert_eq!(body, "Invalid email address format");
    }

    #[actix_web::test]
    async fn register_rejects_malformed_body() {
        let service = test_service();
        let app = test_app!(service);

        let request = test::TestRequest::post()
            .uri("/register")
            .set_payload("{ firstName")
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = test::read_body(response).await;
        assert_eq!(body, "Invalid payload");
    }

    #[actix_web::test]
    async fn register_only_accepts_post() {
        let service = test_service();
        let app = test_app!(service);

        for method in [Method::GET, Method::PUT, Method::DELETE] {
            let request = test::TestRequest::default()
                .method(method)
                .uri("/register")
                .to_request();
            let response = test::call_service(&app, request).await;

            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            let body = test::read_body(response).await;
            assert_eq!(body, "Invalid request method");
        }
    }

    #[actix_web::test]
    async fn count_after_two_registrations() {
        let service = test_service();
        let app = test_app!(service);

        for (first_name, email) in [("Alice", "alice@example.com"), ("Bob", "bob@example.com")] {
            let response = test::call_service(
                &app,
                register_request(json!({
                    "firstName": first_name,
                    "lastName": "Smith",
                    "email": email
                }))
                .to_request(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let request = test::TestRequest::get().uri("/guests/count").to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = test::read_body(response).await;
        assert_eq!(body, r#"{"total":2}"#);
    }

    #[actix_web::test]
    async fn list_defaults_and_page_past_the_end() {
        let service = test_service();
        for i in 0..12 {
            service
                .register(
                    &serde_json::to_vec(&Guest::new(
                        &format!("First{}", i),
                        "Last",
                        &format!("guest{}@example.com", i),
                    ))
                    .unwrap(),
                )
                .unwrap();
        }
        let app = test_app!(service);

        // Without parameters: the first ten guests
        let request = test::TestRequest::get().uri("/guests").to_request();
        let page: GuestPage = test::call_and_read_body_json(&app, request).await;

        assert_eq!((page.page, page.limit, page.total), (1, 10, 12));
        assert_eq!(page.guests.len(), 10);

        // Invalid values fall back to the defaults, the first repeat wins
        let request = test::TestRequest::get()
            .uri("/guests?page=abc&limit=5&limit=7")
            .to_request();
        let page: GuestPage = test::call_and_read_body_json(&app, request).await;

        assert_eq!((page.page, page.limit), (1, 5));

        // Past the end: empty, not an error
        let request = test::TestRequest::get()
            .uri("/guests?page=9&limit=10")
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let page: GuestPage = test::read_body_json(response).await;
        assert!(page.guests.is_empty());
        assert_eq!(page.total, 12);
    }

    #[actix_web::test]
    async fn search_by_name() {
        let service = test_service();
        for guest in [
            Guest::new("Charlie", "White", "charlie@example.com"),
            Guest::new("David", "Green", "david@example.com"),
        ] {
            service
                .register(&serde_json::to_vec(&guest).unwrap())
                .unwrap();
        }
        let app = test_app!(service);

        let request = test::TestRequest::get()
            .uri("/guests/search?name=charlie")
            .to_request();
        let found: Vec<Guest> = test::call_and_read_body_json(&app, request).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Charlie");

        // No match is an empty list, not null
        let request = test::TestRequest::get()
            .uri("/guests/search?name=nobody")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = test::read_body(response).await;
        assert_eq!(body, "[]");

        // Missing name
        let request = test::TestRequest::get().uri("/guests/search").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn count_starts_at_zero() {
        let service = test_service();
        let app = test_app!(service);

        let request = test::TestRequest::get().uri("/guests/count").to_request();
        let count: GuestCount = test::call_and_read_body_json(&app, request).await;

        assert_eq!(count, GuestCount { total: 0 });
    }

    #[actix_web::test]
    async fn read_routes_answer_any_method() {
        let service = test_service();
        let app = test_app!(service);

        let request = test::TestRequest::post().uri("/guests/count").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = test::read_body(response).await;
        assert_eq!(body, r#"{"total":0}"#);

        let request = test::TestRequest::post().uri("/guests").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let request = test::TestRequest::delete()
            .uri("/guests/search?name=john")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn register_accepts_large_bodies_up_to_the_limit() {
        let service = test_service();
        let app = test_app!(service);

        // Given a valid guest well above actix's default 256 KiB body limit
        let first_name = "A".repeat(300_000);
        let response = test::call_service(
            &app,
            register_request(json!({
                "firstName": first_name,
                "lastName": "Doe",
                "email": "a@b.co"
            }))
            .to_request(),
        )
        .await;

        // Then it is registered
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[actix_web::test]
    async fn register_rejects_bodies_over_the_limit() {
        let service = test_service();
        let app = test_app!(service);

        let request = test::TestRequest::post()
            .uri("/register")
            .set_payload(vec![b' '; MAX_PAYLOAD_BYTES + 1])
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(service.count().total, 0);
    }

    #[actix_web::test]
    async fn strict_write_failure_is_an_internal_error() {
        // Given a store whose writes always fail, in strict mode
        let service = Data::new(GuestService::new(Arc::new(GuestStore::with_storage(
            Box::new(ReadOnlyStorage),
            WriteMode::Strict,
        ))));
        let app = test_app!(service);

        // When a valid guest is registered
        let response = test::call_service(
            &app,
            register_request(json!({
                "firstName": "John",
                "lastName": "Doe",
                "email": "john.doe@example.com"
            }))
            .to_request(),
        )
        .await;

        // Then the failure is surfaced as plain text and nothing is kept
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/plain; charset=utf-8"
        );
        let body = test::read_body(response).await;
        assert_eq!(
            body,
            "Unable to persist guest: Unable to write blob: read only"
        );
        assert_eq!(service.count().total, 0);
    }
}
