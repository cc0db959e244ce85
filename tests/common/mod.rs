//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tonic::transport::Channel;

use ext_proc_inspector::config::ServerConfig;
use ext_proc_inspector::grpc::{GrpcServer, ServerError};
use ext_proc_inspector::lifecycle::Shutdown;
use ext_proc_inspector::processor::StreamTracker;
use ext_proc_inspector::proto::ext_proc::external_processor_client::ExternalProcessorClient;
use ext_proc_inspector::proto::ext_proc::{
    processing_request, HttpBody, HttpHeaders, ProcessingRequest,
};
use ext_proc_inspector::proto::base::{HeaderMap, HeaderValue};

/// A server running on an ephemeral local port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub tracker: StreamTracker,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

/// Start the gRPC server on 127.0.0.1 with an OS-assigned port.
pub async fn start_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = GrpcServer::new(ServerConfig::default());
    let tracker = server.tracker();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    TestServer {
        addr,
        shutdown,
        tracker,
        handle,
    }
}

/// Connect to the server, retrying while it starts up.
pub async fn connect(addr: SocketAddr) -> Channel {
    let endpoint = format!("http://{}", addr);
    for _ in 0..50 {
        if let Ok(channel) = Channel::from_shared(endpoint.clone()).unwrap().connect().await {
            return channel;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server at {} never became reachable", addr);
}

#[allow(dead_code)]
pub async fn ext_proc_client(addr: SocketAddr) -> ExternalProcessorClient<Channel> {
    ExternalProcessorClient::new(connect(addr).await)
}

#[allow(dead_code)]
pub fn request_headers(pairs: &[(&str, &str)]) -> ProcessingRequest {
    ProcessingRequest {
        async_mode: false,
        request: Some(processing_request::Request::RequestHeaders(headers(pairs))),
    }
}

#[allow(dead_code)]
pub fn response_headers(pairs: &[(&str, &str)]) -> ProcessingRequest {
    ProcessingRequest {
        async_mode: false,
        request: Some(processing_request::Request::ResponseHeaders(headers(pairs))),
    }
}

#[allow(dead_code)]
pub fn request_body(body: &[u8], end_of_stream: bool) -> ProcessingRequest {
    ProcessingRequest {
        async_mode: false,
        request: Some(processing_request::Request::RequestBody(HttpBody {
            body: body.to_vec(),
            end_of_stream,
        })),
    }
}

#[allow(dead_code)]
pub fn response_body(body: &[u8], end_of_stream: bool) -> ProcessingRequest {
    ProcessingRequest {
        async_mode: false,
        request: Some(processing_request::Request::ResponseBody(HttpBody {
            body: body.to_vec(),
            end_of_stream,
        })),
    }
}

#[allow(dead_code)]
fn headers(pairs: &[(&str, &str)]) -> HttpHeaders {
    HttpHeaders {
        headers: Some(HeaderMap {
            headers: pairs
                .iter()
                .map(|(key, value)| HeaderValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    raw_value: Vec::new(),
                })
                .collect(),
        }),
        end_of_stream: false,
    }
}
