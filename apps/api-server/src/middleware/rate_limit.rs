//! Rate limiting middleware.
//!
//! Wraps a route with a per-endpoint fixed-window policy. Rejections
//! short-circuit with a 429 and the retry metadata; admitted requests pass
//! through untouched except for the quota headers stamped on the response.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{self, HeaderMap, HeaderName, HeaderValue},
};
use chrono::{SecondsFormat, TimeZone, Utc};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use pagebin_core::ports::{Endpoint, RateLimiter};
use pagebin_shared::RateLimitedResponse;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Client identifier for bucketing counters: the first hop of
/// `x-forwarded-for`, else `x-real-ip`, else a shared "unknown" bucket.
/// Unidentifiable clients collectively sharing one bucket is intentional.
fn client_identifier(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        return real_ip.trim().to_string();
    }

    "unknown".to_string()
}

/// Rate limiting middleware factory, bound to one endpoint's policy.
pub struct RateLimit {
    endpoint: Endpoint,
    limiter: Arc<dyn RateLimiter>,
}

impl RateLimit {
    pub fn new(endpoint: Endpoint, limiter: Arc<dyn RateLimiter>) -> Self {
        Self { endpoint, limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService {
            service: Rc::new(service),
            endpoint: self.endpoint,
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitService<S> {
    service: Rc<S>,
    endpoint: Endpoint,
    limiter: Arc<dyn RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let limiter = self.limiter.clone();
        let endpoint = self.endpoint;
        let policy = endpoint.policy();

        Box::pin(async move {
            let identifier = client_identifier(req.headers());

            let decision = match limiter.check(endpoint, &identifier, policy).await {
                Ok(decision) => decision,
                Err(e) => {
                    // Limiter backend failure fails open.
                    tracing::error!(endpoint = %endpoint, error = %e, "rate limiter error, failing open");
                    let res = service.call(req).await?;
                    return Ok(res.map_into_left_body());
                }
            };

            if !decision.allowed {
                tracing::warn!(
                    endpoint = %endpoint,
                    identifier = %identifier,
                    "rate limit exceeded"
                );

                let now_ms = Utc::now().timestamp_millis();
                let retry_after = decision.retry_after_secs(now_ms);
                let reset_at = Utc
                    .timestamp_millis_opt(decision.reset_at_ms)
                    .single()
                    .unwrap_or_else(Utc::now)
                    .to_rfc3339_opts(SecondsFormat::Secs, true);

                let response = HttpResponse::TooManyRequests()
                    .insert_header((header::RETRY_AFTER, retry_after.to_string()))
                    .insert_header((LIMIT_HEADER, policy.max_requests.to_string()))
                    .insert_header((REMAINING_HEADER, "0"))
                    .insert_header((RESET_HEADER, decision.reset_at_ms.to_string()))
                    .json(RateLimitedResponse::new(&reset_at, retry_after));

                let (http_req, _payload) = req.into_parts();
                let srv_response = ServiceResponse::new(http_req, response);
                return Ok(srv_response.map_into_right_body());
            }

            // Admitted: forward to the handler and stamp quota headers on
            // whatever it produced, leaving status and body alone.
            let res = service.call(req).await?;
            let mut res = res.map_into_left_body();

            let headers = res.headers_mut();
            headers.insert(
                HeaderName::from_static(LIMIT_HEADER),
                HeaderValue::from(policy.max_requests),
            );
            headers.insert(
                HeaderName::from_static(REMAINING_HEADER),
                HeaderValue::from(decision.remaining),
            );
            headers.insert(
                HeaderName::from_static(RESET_HEADER),
                HeaderValue::from(decision.reset_at_ms),
            );

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use actix_web::{App, web};
    use pagebin_infra::FixedWindowLimiter;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        map
    }

    #[test]
    fn test_client_identifier_prefers_forwarded_for() {
        let map = headers(&[
            ("x-forwarded-for", "1.2.3.4, 5.6.7.8"),
            ("x-real-ip", "9.9.9.9"),
        ]);
        assert_eq!(client_identifier(&map), "1.2.3.4");
    }

    #[test]
    fn test_client_identifier_falls_back_to_real_ip() {
        let map = headers(&[("x-real-ip", "9.9.9.9")]);
        assert_eq!(client_identifier(&map), "9.9.9.9");
    }

    #[test]
    fn test_client_identifier_unknown_without_headers() {
        assert_eq!(client_identifier(&HeaderMap::new()), "unknown");
    }

    async fn ok_handler() -> HttpResponse {
        HttpResponse::Ok().body("hello")
    }

    #[actix_web::test]
    async fn test_admitted_response_carries_quota_headers() {
        let limiter: Arc<dyn RateLimiter> = Arc::new(FixedWindowLimiter::new());
        let app = actix_test::init_service(
            App::new().service(
                web::resource("/login")
                    .wrap(RateLimit::new(Endpoint::Login, limiter))
                    .route(web::post().to(ok_handler)),
            ),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/login")
            .insert_header(("x-real-ip", "9.9.9.9"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get(LIMIT_HEADER).unwrap().to_str().unwrap(), "5");
        assert_eq!(
            res.headers().get(REMAINING_HEADER).unwrap().to_str().unwrap(),
            "4"
        );
        assert!(res.headers().contains_key(RESET_HEADER));
    }

    #[actix_web::test]
    async fn test_rejection_after_policy_ceiling() {
        let limiter: Arc<dyn RateLimiter> = Arc::new(FixedWindowLimiter::new());
        let app = actix_test::init_service(
            App::new().service(
                web::resource("/register")
                    .wrap(RateLimit::new(Endpoint::Register, limiter))
                    .route(web::post().to(ok_handler)),
            ),
        )
        .await;

        // register policy admits 3 per hour
        for _ in 0..3 {
            let req = actix_test::TestRequest::post()
                .uri("/register")
                .insert_header(("x-forwarded-for", "1.2.3.4"))
                .to_request();
            let res = actix_test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::OK);
        }

        let req = actix_test::TestRequest::post()
            .uri("/register")
            .insert_header(("x-forwarded-for", "1.2.3.4"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            res.headers().get(REMAINING_HEADER).unwrap().to_str().unwrap(),
            "0"
        );
        assert!(res.headers().contains_key(header::RETRY_AFTER));

        let body: serde_json::Value = actix_test::read_body_json(res).await;
        assert_eq!(body["error"], "Rate limit exceeded");
        assert_eq!(body["statusCode"], 429);
        assert!(body["retryAfter"].as_i64().unwrap() > 0);
    }

    #[actix_web::test]
    async fn test_distinct_clients_do_not_share_counters() {
        let limiter: Arc<dyn RateLimiter> = Arc::new(FixedWindowLimiter::new());
        let app = actix_test::init_service(
            App::new().service(
                web::resource("/register")
                    .wrap(RateLimit::new(Endpoint::Register, limiter))
                    .route(web::post().to(ok_handler)),
            ),
        )
        .await;

        for _ in 0..3 {
            let req = actix_test::TestRequest::post()
                .uri("/register")
                .insert_header(("x-forwarded-for", "1.2.3.4"))
                .to_request();
            actix_test::call_service(&app, req).await;
        }

        // A different client is unaffected by the first one's exhaustion.
        let req = actix_test::TestRequest::post()
            .uri("/register")
            .insert_header(("x-forwarded-for", "5.6.7.8"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
