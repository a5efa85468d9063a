mod service;

use clap::Parser;
use tonic::transport::Server;
use tonic_reflection::server::Builder as ReflectionBuilder;

pub mod pb {
    tonic::include_proto!("grpc.health.v1");
    tonic::include_proto!("helloworld");
    tonic::include_proto!("proto");

    pub(crate) const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("testing_descriptor");
}

#[derive(Parser, Debug)]
#[command(
    name = "testserver",
    about = "Test gRPC server for discovery-tool verification"
)]
struct Cli {
    /// Port to listen on (0 for ephemeral)
    #[arg(short = 'p', long = "port", default_value_t = 0)]
    port: u16,

    /// Suppress request logging
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Disable server reflection
    #[arg(long = "noreflect")]
    noreflect: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", cli.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    println!("Listening on {}", local_addr);

    let health = pb::health_server::HealthServer::new(service::HealthImpl);
    let greeter = pb::greeter_server::GreeterServer::new(service::GreeterImpl);
    let user_service = pb::user_service_server::UserServiceServer::new(service::UserServiceImpl);
    let product_service =
        pb::product_service_server::ProductServiceServer::new(service::ProductServiceImpl);
    let debug_service = pb::debug_service_server::DebugServiceServer::new(service::DebugServiceImpl);

    let mut builder = Server::builder();

    if !cli.noreflect {
        let reflection_service = ReflectionBuilder::configure()
            .register_encoded_file_descriptor_set(pb::FILE_DESCRIPTOR_SET)
            .build_v1()?;

        let reflection_service_alpha = ReflectionBuilder::configure()
            .register_encoded_file_descriptor_set(pb::FILE_DESCRIPTOR_SET)
            .build_v1alpha()?;

        builder
            .add_service(reflection_service)
            .add_service(reflection_service_alpha)
            .add_service(health)
            .add_service(greeter)
            .add_service(user_service)
            .add_service(product_service)
            .add_service(debug_service)
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await?;
    } else {
        builder
            .add_service(health)
            .add_service(greeter)
            .add_service(user_service)
            .add_service(product_service)
            .add_service(debug_service)
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await?;
    }

    Ok(())
}
