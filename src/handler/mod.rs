//! The processing pipeline contract.
//!
//! Once the client has its bytes, the engine hands each exchange to a
//! handler for inspection. Handlers run synchronously on the request's own
//! task; distinct requests may invoke the same handler concurrently, so
//! implementations must be `Send + Sync`. Nothing a handler does can change
//! the response already sent; errors are the handler's own business.

use std::io::Read;

use crate::proxy::snapshot::Exchange;

/// Receives one decoded exchange per proxied request.
pub trait ExchangeHandler: Send + Sync {
    fn handle(&self, exchange: &mut Exchange<'_>);
}

/// Default pipeline: log a summary of each exchange.
#[derive(Debug, Default)]
pub struct LogHandler;

impl ExchangeHandler for LogHandler {
    fn handle(&self, exchange: &mut Exchange<'_>) {
        let mut body = Vec::new();
        let decoded_bytes = match exchange.body.read_to_end(&mut body) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "exchange body read failed");
                body.len()
            }
        };

        tracing::info!(
            https = exchange.request.https,
            host = %exchange.request.host,
            method = %exchange.request.method,
            target = %exchange.request.target,
            content_type = %exchange.response.content_type,
            decoded_bytes,
            "exchange"
        );
    }
}
