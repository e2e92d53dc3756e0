//! HTTP trigger surface.
//!
//! One route per configured switch at `/<name>`, any method. A hit runs
//! the switch's action and answers `201 Created` with an empty body;
//! action failures stay in the log.

use std::future::Future;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::any;
use log::info;
use tokio::net::TcpListener;

use crate::app::ports::{GpioPort, Notifier, PanelPort};
use crate::app::service::SwitchBoard;

/// Build the router for every switch on `board`.
pub fn router<G, P, N>(board: SwitchBoard<G, P, N>) -> Router
where
    G: GpioPort + 'static,
    P: PanelPort + 'static,
    N: Notifier,
{
    let mut router = Router::new();
    for sw in &board.config().switches {
        let endpoint = format!("/{}", sw.name);
        info!("Configuring {} for switch '{}' ({:?})", endpoint, sw.name, sw.kind);
        let name = sw.name.clone();
        let handler_board = board.clone();
        router = router.route(
            &endpoint,
            any(move || {
                let board = handler_board.clone();
                let name = name.clone();
                async move {
                    board.trigger(&name).await;
                    StatusCode::CREATED
                }
            }),
        );
    }
    router
}

/// Serve `board`'s routes on `listener` until `shutdown` resolves.
pub async fn serve<G, P, N>(
    listener: TcpListener,
    board: SwitchBoard<G, P, N>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()>
where
    G: GpioPort + 'static,
    P: PanelPort + 'static,
    N: Notifier,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Starting server at {}", addr);
    }
    axum::serve(listener, router(board))
        .with_graceful_shutdown(shutdown)
        .await
}
