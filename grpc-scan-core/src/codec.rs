use tonic::codec::{BufferSettings, Codec, Decoder, Encoder};
use tonic::Status;

/// A gRPC codec that never looks at message contents.
///
/// Every probe this crate issues sends a zero-byte request body and never
/// inspects the response body — existence is inferred entirely from the
/// `grpc-status`/`grpc-message` trailer (see the oracle module). Unlike
/// tonic's `ProstCodec` or a `prost-reflect`-backed dynamic codec, this
/// codec has no notion of a protobuf message type at all: `Encode` and
/// `Decode` are both `()`. This is what makes payload decoding a genuine
/// non-goal rather than a deferred feature — there is no descriptor to
/// decode against.
#[derive(Clone, Copy, Default)]
pub struct EmptyCodec;

impl Codec for EmptyCodec {
    type Encode = ();
    type Decode = ();
    type Encoder = EmptyEncoder;
    type Decoder = EmptyDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        EmptyEncoder
    }

    fn decoder(&mut self) -> Self::Decoder {
        EmptyDecoder
    }
}

/// Encodes `()` as a zero-length message body.
#[derive(Clone, Copy, Default)]
pub struct EmptyEncoder;

impl Encoder for EmptyEncoder {
    type Item = ();
    type Error = Status;

    fn encode(&mut self, _item: (), _dst: &mut tonic::codec::EncodeBuf<'_>) -> Result<(), Status> {
        Ok(())
    }

    fn buffer_settings(&self) -> BufferSettings {
        BufferSettings::default()
    }
}

/// Discards whatever the server sent back; only the existence of a response
/// (as opposed to a transport error) matters to callers.
#[derive(Clone, Copy, Default)]
pub struct EmptyDecoder;

impl Decoder for EmptyDecoder {
    type Item = ();
    type Error = Status;

    fn decode(&mut self, _src: &mut tonic::codec::DecodeBuf<'_>) -> Result<Option<()>, Status> {
        Ok(Some(()))
    }

    fn buffer_settings(&self) -> BufferSettings {
        BufferSettings::default()
    }
}
