use anyhow::bail;
use catalog_tonic_core::types::{DEFAULT_STREAM_BUFFER_SIZE, MAX_IMAGE_SIZE};
use clap::Parser;
use std::path::PathBuf;

/// Runtime configuration for the `catalog-tonic-server` binary.
///
/// All values are parsed from CLI arguments or environment variables, with
/// defaults suitable for local development.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "catalog-tonic-server",
    version,
    about = "A gRPC catalog service for laptop records and image uploads"
)]
pub struct CliArgs {
    /// Address to listen on (TCP or Unix socket path; use --uds for Unix socket).
    ///
    /// Example: "0.0.0.0:50051" or "/tmp/catalog-uds.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:50051"))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,

    /// Directory where uploaded laptop images are written.
    ///
    /// Environment variable: `IMAGE_DIR`
    #[arg(long, env = "IMAGE_DIR", default_value_t = String::from("img"))]
    pub image_dir: String,

    /// Maximum accepted image payload in bytes.
    ///
    /// Uploads whose accumulated chunks exceed this cap are rejected without
    /// persisting a partial asset. The chunk size itself is caller-determined
    /// and not constrained beyond the cumulative cap.
    ///
    /// Environment variable: `MAX_IMAGE_SIZE`
    #[arg(long, env = "MAX_IMAGE_SIZE", default_value_t = MAX_IMAGE_SIZE)]
    pub max_image_size: usize,

    /// Capacity of the response buffer between a store scan and the gRPC
    /// stream.
    ///
    /// Lower values increase backpressure responsiveness; higher values let a
    /// scan run further ahead of a slow consumer.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = DEFAULT_STREAM_BUFFER_SIZE)]
    pub stream_buffer_size: usize,

    /// Number of random sample laptops to register at startup.
    ///
    /// Environment variable: `SEED_LAPTOPS`
    #[arg(long, env = "SEED_LAPTOPS", default_value_t = 0)]
    pub seed_laptops: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub uds: bool,
    pub image_dir: PathBuf,
    pub max_image_size: usize,
    pub stream_buffer_size: usize,
    pub seed_laptops: usize,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.max_image_size == 0 {
            bail!("MAX_IMAGE_SIZE must be greater than 0");
        }

        // The upload response reports the accepted size as a u32.
        if u32::try_from(args.max_image_size).is_err() {
            bail!("MAX_IMAGE_SIZE must not exceed {}", u32::MAX);
        }

        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }

        Ok(Self {
            server_addr: args.server_addr,
            uds: args.uds,
            image_dir: PathBuf::from(args.image_dir),
            max_image_size: args.max_image_size,
            stream_buffer_size: args.stream_buffer_size,
            seed_laptops: args.seed_laptops,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{CliArgs, ServerConfig};
    use clap::Parser;

    #[test]
    fn rejects_zero_image_cap() {
        let args = CliArgs::parse_from(["test", "--max-image-size", "0"]);
        assert!(ServerConfig::try_from(args).is_err());
    }

    #[test]
    fn rejects_an_image_cap_beyond_the_wire_size() {
        let args = CliArgs::parse_from(["test", "--max-image-size", "4294967296"]);
        assert!(ServerConfig::try_from(args).is_err());
    }

    #[test]
    fn defaults_are_valid() {
        let args = CliArgs::parse_from(["test"]);
        let config = ServerConfig::try_from(args).unwrap();
        assert_eq!(config.max_image_size, 1 << 20);
        assert!(!config.uds);
    }
}
