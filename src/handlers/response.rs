use actix_web::HttpResponse;
use serde::Serialize;

/// Body shape shared by every response: `{type, status, message, data}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub status: &'static str,
    pub message: String,
    pub data: Option<T>,
}

pub fn ok<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope {
        kind: "success",
        status: "OK",
        message: message.to_string(),
        data: Some(data),
    })
}
