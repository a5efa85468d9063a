use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tonic_reflection::pb::v1;
use tonic_reflection::pb::v1::server_reflection_client::ServerReflectionClient as V1Client;
use tonic_reflection::pb::v1alpha;

use crate::error::{Result, ScanError};

/// Reflection API version: 0=unknown, 1=v1, 2=v1alpha
const VERSION_UNKNOWN: u8 = 0;
const VERSION_V1: u8 = 1;
const VERSION_V1ALPHA: u8 = 2;

/// Result of a reflection probe against one target.
///
/// `enabled` is true only when a non-empty service list was actually
/// received — a reflection stream that opens but yields zero services is
/// `enabled = false`, so the candidate-based fallback still runs.
#[derive(Debug, Clone, Default)]
pub struct ReflectionResult {
    pub enabled: bool,
    pub services: Vec<String>,
}

/// Server reflection client with v1/v1alpha auto-negotiation.
///
/// Tries v1 first, falls back to v1alpha on `Unimplemented`, and caches
/// whichever version worked so repeated calls skip renegotiation. Unlike a
/// descriptor-resolving reflection client, this one never builds a
/// `DescriptorPool`: `file_containing_symbol` responses are only used to
/// count descriptor bytes for a verbose-mode log line.
pub struct ServerSource {
    channel: Channel,
    version: AtomicU8,
}

impl ServerSource {
    pub fn new(channel: Channel) -> Self {
        ServerSource {
            channel,
            version: AtomicU8::new(VERSION_UNKNOWN),
        }
    }

    /// List services, reporting `enabled = false` on any failure or an empty list.
    pub async fn probe(&self) -> ReflectionResult {
        match self.list_services_async().await {
            Ok(services) if !services.is_empty() => {
                for service in &services {
                    match self.file_containing_symbol_byte_count(service).await {
                        Ok(len) => tracing::debug!(service, descriptor_bytes = len, "reflection file_containing_symbol"),
                        Err(err) => tracing::debug!(service, %err, "file_containing_symbol failed"),
                    }
                }
                ReflectionResult {
                    enabled: true,
                    services,
                }
            }
            _ => ReflectionResult::default(),
        }
    }

    /// Fetch the file descriptor bytes containing `symbol`, returning only
    /// their total length; never decoded into a descriptor pool.
    pub async fn file_containing_symbol_byte_count(&self, symbol: &str) -> Result<usize> {
        let msg = v1::server_reflection_request::MessageRequest::FileContainingSymbol(
            symbol.to_string(),
        );
        let resp = self.reflect(msg).await?;
        match resp {
            v1::server_reflection_response::MessageResponse::FileDescriptorResponse(fdr) => {
                Ok(fdr.file_descriptor_proto.iter().map(Vec::len).sum())
            }
            _ => Ok(0),
        }
    }

    async fn list_services_async(&self) -> Result<Vec<String>> {
        let msg = v1::server_reflection_request::MessageRequest::ListServices(String::new());
        let resp = self.reflect(msg).await?;

        match resp {
            v1::server_reflection_response::MessageResponse::ListServicesResponse(list) => {
                Ok(list.service.into_iter().map(|s| s.name).collect())
            }
            _ => Err(ScanError::Other(
                "unexpected reflection response for list_services".into(),
            )),
        }
    }

    /// Send a reflection request, negotiating v1/v1alpha and caching the result.
    async fn reflect(
        &self,
        message_request: v1::server_reflection_request::MessageRequest,
    ) -> Result<v1::server_reflection_response::MessageResponse> {
        let cached = self.version.load(Ordering::Relaxed);
        match cached {
            VERSION_V1 => return self.reflect_v1(message_request).await,
            VERSION_V1ALPHA => return self.reflect_v1alpha(message_request).await,
            _ => {}
        }

        match self.reflect_v1(message_request.clone()).await {
            Ok(resp) => {
                self.version.store(VERSION_V1, Ordering::Relaxed);
                Ok(resp)
            }
            Err(e) if is_unimplemented(&e) => {
                let resp = self.reflect_v1alpha(message_request).await?;
                self.version.store(VERSION_V1ALPHA, Ordering::Relaxed);
                Ok(resp)
            }
            Err(e) => Err(e),
        }
    }

    async fn reflect_v1(
        &self,
        message_request: v1::server_reflection_request::MessageRequest,
    ) -> Result<v1::server_reflection_response::MessageResponse> {
        let request = v1::ServerReflectionRequest {
            host: String::new(),
            message_request: Some(message_request),
        };

        let (tx, rx) = mpsc::channel(1);
        tx.send(request)
            .await
            .map_err(|_| ScanError::Other("failed to send reflection request".into()))?;
        drop(tx);

        let mut client = V1Client::new(self.channel.clone());
        let response = client
            .server_reflection_info(tonic::Request::new(ReceiverStream::new(rx)))
            .await
            .map_err(map_status_error)?;

        let mut stream = response.into_inner();
        let resp = stream
            .message()
            .await
            .map_err(ScanError::GrpcStatus)?
            .ok_or_else(|| ScanError::Other("empty reflection response stream".into()))?;

        extract_response(resp.message_response)
    }

    async fn reflect_v1alpha(
        &self,
        message_request: v1::server_reflection_request::MessageRequest,
    ) -> Result<v1::server_reflection_response::MessageResponse> {
        let alpha_request = convert_request_to_v1alpha(message_request);

        let (tx, rx) = mpsc::channel(1);
        tx.send(alpha_request)
            .await
            .map_err(|_| ScanError::Other("failed to send reflection request".into()))?;
        drop(tx);

        let mut client =
            v1alpha::server_reflection_client::ServerReflectionClient::new(self.channel.clone());
        let response = client
            .server_reflection_info(tonic::Request::new(ReceiverStream::new(rx)))
            .await
            .map_err(map_status_error)?;

        let mut stream = response.into_inner();
        let resp = stream
            .message()
            .await
            .map_err(ScanError::GrpcStatus)?
            .ok_or_else(|| ScanError::Other("empty reflection response stream".into()))?;

        convert_response_from_v1alpha(resp)
    }
}

fn map_status_error(status: tonic::Status) -> ScanError {
    ScanError::GrpcStatus(status)
}

fn is_unimplemented(err: &ScanError) -> bool {
    matches!(err, ScanError::GrpcStatus(s) if s.code() == tonic::Code::Unimplemented)
}

fn extract_response(
    msg: Option<v1::server_reflection_response::MessageResponse>,
) -> Result<v1::server_reflection_response::MessageResponse> {
    let msg = msg.ok_or_else(|| ScanError::Other("reflection response has no message".into()))?;

    if let v1::server_reflection_response::MessageResponse::ErrorResponse(ref err) = msg {
        return Err(ScanError::Other(
            format!(
                "reflection error (code {}): {}",
                err.error_code, err.error_message
            )
            .into(),
        ));
    }

    Ok(msg)
}

fn convert_request_to_v1alpha(
    msg: v1::server_reflection_request::MessageRequest,
) -> v1alpha::ServerReflectionRequest {
    use v1::server_reflection_request::MessageRequest;
    let alpha_msg = match msg {
        MessageRequest::FileByFilename(s) => {
            v1alpha::server_reflection_request::MessageRequest::FileByFilename(s)
        }
        MessageRequest::FileContainingSymbol(s) => {
            v1alpha::server_reflection_request::MessageRequest::FileContainingSymbol(s)
        }
        MessageRequest::FileContainingExtension(ext) => {
            v1alpha::server_reflection_request::MessageRequest::FileContainingExtension(
                v1alpha::ExtensionRequest {
                    containing_type: ext.containing_type,
                    extension_number: ext.extension_number,
                },
            )
        }
        MessageRequest::AllExtensionNumbersOfType(s) => {
            v1alpha::server_reflection_request::MessageRequest::AllExtensionNumbersOfType(s)
        }
        MessageRequest::ListServices(s) => {
            v1alpha::server_reflection_request::MessageRequest::ListServices(s)
        }
    };
    v1alpha::ServerReflectionRequest {
        host: String::new(),
        message_request: Some(alpha_msg),
    }
}

fn convert_response_from_v1alpha(
    resp: v1alpha::ServerReflectionResponse,
) -> Result<v1::server_reflection_response::MessageResponse> {
    use v1alpha::server_reflection_response::MessageResponse;
    let msg = resp
        .message_response
        .ok_or_else(|| ScanError::Other("reflection response has no message".into()))?;

    let v1_msg = match msg {
        MessageResponse::FileDescriptorResponse(fdr) => {
            v1::server_reflection_response::MessageResponse::FileDescriptorResponse(
                v1::FileDescriptorResponse {
                    file_descriptor_proto: fdr.file_descriptor_proto,
                },
            )
        }
        MessageResponse::AllExtensionNumbersResponse(ext) => {
            v1::server_reflection_response::MessageResponse::AllExtensionNumbersResponse(
                v1::ExtensionNumberResponse {
                    base_type_name: ext.base_type_name,
                    extension_number: ext.extension_number,
                },
            )
        }
        MessageResponse::ListServicesResponse(list) => {
            v1::server_reflection_response::MessageResponse::ListServicesResponse(
                v1::ListServiceResponse {
                    service: list
                        .service
                        .into_iter()
                        .map(|s| v1::ServiceResponse { name: s.name })
                        .collect(),
                },
            )
        }
        MessageResponse::ErrorResponse(err) => {
            return Err(ScanError::Other(
                format!(
                    "reflection error (code {}): {}",
                    err.error_code, err.error_message
                )
                .into(),
            ));
        }
    };

    Ok(v1_msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflection_result_default_is_disabled() {
        let result = ReflectionResult::default();
        assert!(!result.enabled);
        assert!(result.services.is_empty());
    }
}
