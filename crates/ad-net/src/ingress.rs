//! WebSocket frame ingress
//!
//! The phone page streams its camera as one JPEG per binary WebSocket
//! message. Every decodable frame overwrites the shared frame slot; frames
//! that fail to decode are skipped and the slot keeps its previous value.

use std::net::SocketAddr;
use std::sync::Arc;

use ad_core::FrameExchange;
use futures_util::StreamExt;
use image::{ImageFormat, RgbImage};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;

use crate::{IngressConfig, NetError, NetResult};

/// Decode one JPEG still. `None` when the bytes are not a JPEG image.
pub fn decode_jpeg(bytes: &[u8]) -> Option<RgbImage> {
    match image::load_from_memory_with_format(bytes, ImageFormat::Jpeg) {
        Ok(image) => Some(image.to_rgb8()),
        Err(e) => {
            log::debug!("[Ingress] Dropping undecodable frame ({} bytes): {}", bytes.len(), e);
            None
        }
    }
}

/// Handle that stops a running [`FrameIngress`]
#[derive(Clone)]
pub struct IngressShutdown {
    tx: broadcast::Sender<()>,
}

impl IngressShutdown {
    pub fn trigger(&self) {
        // No receivers just means nothing is running anymore
        let _ = self.tx.send(());
    }
}

/// WebSocket server feeding the frame exchange
pub struct FrameIngress {
    listener: TcpListener,
    frames: Arc<FrameExchange>,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl FrameIngress {
    pub async fn bind(config: &IngressConfig, frames: Arc<FrameExchange>) -> NetResult<Self> {
        let addr = config.addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| NetError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        log::info!("[Ingress] WebSocket frame ingress on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            frames,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn local_addr(&self) -> NetResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> IngressShutdown {
        IngressShutdown {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Accept phone connections until shutdown is triggered
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let frames = Arc::clone(&self.frames);
                            let shutdown_rx = self.shutdown_tx.subscribe();
                            tokio::spawn(async move {
                                Self::handle_connection(stream, peer, frames, shutdown_rx).await;
                            });
                        }
                        Err(e) => {
                            log::warn!("[Ingress] Accept failed: {}", e);
                        }
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    break;
                }
            }
        }

        log::info!("[Ingress] Stopped");
    }

    async fn handle_connection(
        stream: TcpStream,
        peer: SocketAddr,
        frames: Arc<FrameExchange>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let mut ws_stream = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                log::debug!("[Ingress] Handshake with {} failed: {}", peer, e);
                return;
            }
        };
        log::info!("[Ingress] Camera connected from {}", peer);

        loop {
            tokio::select! {
                msg = ws_stream.next() => {
                    match msg {
                        Some(Ok(Message::Binary(data))) => {
                            // Decoding a full frame takes milliseconds; keep it off the
                            // async workers. Awaiting keeps frames in arrival order.
                            let frames = Arc::clone(&frames);
                            let decoded = tokio::task::spawn_blocking(move || {
                                decode_jpeg(&data[..]).map(|image| frames.publish(image))
                            })
                            .await;
                            if let Err(e) = decoded {
                                log::warn!("[Ingress] Frame decode task failed: {}", e);
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            log::warn!("[Ingress] WebSocket error from {}: {}", peer, e);
                            break;
                        }
                        _ => {} // Ignore text/ping/pong
                    }
                }

                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }

        log::info!("[Ingress] Camera {} disconnected", peer);
    }
}
