use catalog_tonic_core::proto::FILE_DESCRIPTOR_SET;
use catalog_tonic_core::proto::laptop_service_server::LaptopServiceServer;
use catalog_tonic_server::server::config::{CliArgs, ServerConfig};
use catalog_tonic_server::server::sample;
use catalog_tonic_server::server::service::handler::CatalogService;
use catalog_tonic_server::server::store::image::DiskImageStore;
use catalog_tonic_server::server::store::laptop::{InMemoryLaptopStore, LaptopStore};
use catalog_tonic_server::server::telemetry::init_telemetry;
use clap::Parser;
use futures::Stream;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::server::Connected;
use tonic::{codec::CompressionEncoding, transport::Server};
use tonic_health::server::HealthReporter;
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    init_telemetry()?;

    if config.uds {
        #[cfg(unix)]
        {
            use tokio::net::UnixListener;
            use tokio_stream::wrappers::UnixListenerStream;
            let uds_path = config.server_addr.clone();
            let uds = UnixListener::bind(&uds_path)?;
            let incoming = UnixListenerStream::new(uds);
            tracing::info!("Starting catalog service on {}", uds_path);
            let res = run_server_with_incoming(incoming, config).await;
            // Best effort to clean up the socket file although a panic might
            // leave it behind.
            let _ = std::fs::remove_file(&uds_path);
            res
        }
        #[cfg(not(unix))]
        {
            anyhow::bail!("Unix domain sockets are not supported on this platform");
        }
    } else {
        let tcp_addr = config.server_addr.clone();
        let tcp = TcpListener::bind(&tcp_addr).await?;
        let incoming = TcpListenerStream::new(tcp);
        tracing::info!("Starting catalog service on {}", tcp_addr);
        run_server_with_incoming(incoming, config).await
    }
}

async fn run_server_with_incoming<I, IO, IE>(incoming: I, config: ServerConfig) -> anyhow::Result<()>
where
    I: Stream<Item = Result<IO, IE>>,
    IO: AsyncRead + AsyncWrite + Connected + Unpin + Send + 'static,
    IE: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<LaptopServiceServer<CatalogService>>()
        .await;

    let laptop_store: Arc<dyn LaptopStore> = Arc::new(InMemoryLaptopStore::new());
    let image_store = Arc::new(DiskImageStore::new(config.image_dir.clone()));

    if config.seed_laptops > 0 {
        sample::seed(laptop_store.as_ref(), config.seed_laptops).await?;
    }

    let service = CatalogService::new(config, laptop_store, image_store);

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1alpha()?;

    Server::builder()
        .accept_http1(true)
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(GrpcWebLayer::new()),
        )
        .add_service(health_service)
        .add_service(reflection)
        .add_service(build_laptop_service(service.clone()))
        .serve_with_incoming_shutdown(incoming, shutdown_signal(service, health_reporter))
        .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn build_laptop_service(service: CatalogService) -> LaptopServiceServer<CatalogService> {
    LaptopServiceServer::new(service)
        .send_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Gzip)
}

async fn shutdown_signal(service: CatalogService, mut health_reporter: HealthReporter) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");

    // 1. Publish the status
    health_reporter
        .set_not_serving::<LaptopServiceServer<CatalogService>>()
        .await;

    // 2. Cancel in-flight scans and uploads
    service.shutdown();
}
