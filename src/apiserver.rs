// apiserver.rs

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::Response,
    routing::*,
    Json, Router,
};
pub use axum_macros::debug_handler;
use futures::{SinkExt, StreamExt};
use log::*;
use tokio::sync::mpsc;

use crate::*;

/// Frames waiting for one client before the channel counts as not writable.
pub const OUTBOUND_QUEUE_LEN: usize = 8;

pub async fn run_api_server(state: Arc<MyState>) -> anyhow::Result<()> {
    loop {
        if *state.wifi_up.read().await {
            break;
        }
        sleep(Duration::from_secs(1)).await;
    }

    let listen = format!("0.0.0.0:{}", state.config.port);
    let addr = listen.parse::<net::SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        "API server {} listening to {listen}, station address {}",
        state.myid.read().await,
        state.ip_addr.read().await
    );
    serve_api(state, listener).await
}

pub fn router(state: Arc<MyState>) -> Router {
    Router::new()
        .route("/ws", get(get_ws))
        .route("/uptime", get(get_uptime))
        .route("/temp", get(get_temp))
        .with_state(state)
}

/// Serve the API on an already bound listener.
pub async fn serve_api(state: Arc<MyState>, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    Ok(axum::serve(listener, router(state).into_make_service()).await?)
}

#[debug_handler]
pub async fn get_ws(State(state): State<Arc<MyState>>, ws: WebSocketUpgrade) -> Response {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    let id = state.next_client_id();
    info!("#{cnt} get_ws() client {id}");

    ws.on_upgrade(move |socket| client_channel(state, id, socket))
}

/// Pump frames between one WebSocket and the control loop until either side ends.
///
/// The control loop closes the socket by dropping the outbound sender, which
/// is how a refused client gets disconnected without a frame.
async fn client_channel(state: Arc<MyState>, id: ClientId, socket: WebSocket) {
    let (outbound, mut out_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_LEN);
    if state
        .events
        .send(ChannelEvent::Connected { id, outbound })
        .await
        .is_err()
    {
        error!("Control loop gone, dropping client {id}");
        return;
    }

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            out = out_rx.recv() => match out {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        debug!("Client {id} write failed: {e}");
                        break;
                    }
                }
                None => {
                    info!("Closing client {id}");
                    let _ = sink.close().await;
                    break;
                }
            },
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let text = text.as_str().to_owned();
                    if state.events.send(ChannelEvent::Message { id, text }).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                // binary, ping and pong carry no commands
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Client {id} read failed: {e}");
                    break;
                }
            },
        }
    }

    // queued after every message from this client, so ordering holds
    let _ = state.events.send(ChannelEvent::Disconnected { id }).await;
}

pub async fn get_uptime(State(state): State<Arc<MyState>>) -> (StatusCode, Json<Uptime>) {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_uptime()");

    let uptime = *state.uptime.read().await;
    (StatusCode::OK, Json(Uptime::new(uptime)))
}

pub async fn get_temp(State(state): State<Arc<MyState>>) -> (StatusCode, Json<DeviceStatus>) {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_temp()");

    let mut ret = state.status.read().await.clone();
    ret.uptime = *state.uptime.read().await;
    ret.device = state.myid.read().await.clone();
    (StatusCode::OK, Json(ret))
}

// EOF
