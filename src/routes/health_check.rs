use actix_web::HttpResponse;

/// `GET /health_check`
///
/// Liveness check for the load balancer; touches neither the waitlist store
/// nor the email API. Returns 200 with an empty body.
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }
