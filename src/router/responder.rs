use tokio::sync::oneshot;
use tracing::debug;

use crate::protocol::Response;

/// Deferred-response handle for one request.
///
/// Consumed by [`Responder::respond`], so a request is answered at most once.
/// Dropping it unanswered resolves the requester to "no response".
#[derive(Debug)]
pub struct Responder {
    tx: oneshot::Sender<Response>,
}

impl Responder {
    /// A responder and the receiver its answer arrives on.
    pub fn channel() -> (Self, oneshot::Receiver<Response>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn respond(self, response: Response) {
        if self.tx.send(response).is_err() {
            debug!("requester went away before its response was ready");
        }
    }

    /// Resolves once the requester stops waiting.
    pub async fn closed(&mut self) {
        self.tx.closed().await;
    }
}
