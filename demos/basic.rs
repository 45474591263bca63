//! Validated JSON endpoints served over hyper.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice","age":"30"}'
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"age":12}'                              ← 422 with the error as JSON
//!   curl 'http://localhost:3000/users?page=2'
//!   curl 'http://localhost:3000/users?page=zero'      ← 422

use std::net::SocketAddr;
use std::sync::Arc;

use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{error, info};
use tsu_validate::{
    Chain, Config, JsonSchema, Request, Response, Router, Schemas, ValidationError, validate,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let validation = validate(Some(Config::new().on_validation_error(
        |_req, err: ValidationError| async move {
            Response::builder()
                .status(StatusCode::UNPROCESSABLE_ENTITY)
                .json_value(&err)
        },
    )));

    let new_user = JsonSchema::new(json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "age":  { "type": "integer", "minimum": 18 }
        },
        "required": ["name"]
    }))?;

    let paging = JsonSchema::new(json!({
        "type": "object",
        "properties": {
            "page":     { "type": "integer", "minimum": 1 },
            "per_page": { "type": "integer", "minimum": 1, "maximum": 100 }
        }
    }))?;

    let app = Arc::new(
        Router::new()
            .on(Method::POST, "/users", validation.bind_with(Schemas::new().body(new_user), create_user))
            .on(
                Method::GET,
                "/users",
                Chain::new().with(validation.bind(Schemas::new().query(paging))).then(list_users),
            ),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let app = Arc::clone(&app);

        tokio::spawn(async move {
            let svc = service_fn(move |req: hyper::Request<Incoming>| {
                let app = Arc::clone(&app);
                async move {
                    let (parts, body) = req.into_parts();
                    let body = body.collect().await?.to_bytes();
                    let res = app.dispatch(http::Request::from_parts(parts, body)).await;
                    Ok::<_, hyper::Error>(res.map(Full::new))
                }
            });

            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), svc)
                .await
            {
                error!(%peer, error = %e, "connection error");
            }
        });
    }
}

// POST /users
//
// The body reaching here has passed the schema, and `"30"` is already `30`.
async fn create_user(req: Request) -> Response {
    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json_value(req.body())
}

// GET /users?page=2
async fn list_users(req: Request) -> Response {
    let page = req.query_param("page").and_then(Value::as_u64).unwrap_or(1);
    Response::builder().json_value(&json!({ "page": page, "users": [] }))
}
