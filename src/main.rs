use std::{io, sync::Arc};

use clap::Parser;
use guestbook::{
    clients::server::{Server, ServerOptions},
    consts::consts::DEFAULT_DATA_FILE,
    service::guest_service::GuestService,
    storage::store::{GuestStore, StoreOptions, WriteMode},
};

/// 📒 Guestbook, registers guests over HTTP and keeps them in a JSON file
#[derive(Parser, Debug)]
struct Cli {
    /// Backing file for the guest list. Note: Does not support shell paths, e.g. ~
    #[clap(short, long, default_value = DEFAULT_DATA_FILE)]
    data: std::path::PathBuf,

    /// Port the HTTP server will run on
    #[clap(short, long, default_value = "8080")]
    port: u16,

    /// Address the HTTP server will run on
    #[clap(short, long, default_value = "0.0.0.0")]
    address: String,

    /// Log every HTTP request
    #[clap(long)]
    log_http: bool,

    #[clap(long, default_value_t = 2)]
    http_workers: usize,

    /// Fail registrations whose file write fails, instead of only logging the failure
    #[clap(long)]
    strict_writes: bool,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Cli::parse();

    let write_mode = match args.strict_writes {
        true => WriteMode::Strict,
        false => WriteMode::BestEffort,
    };

    log::info!(
        "Guest file location: [{}], write mode: {:?}",
        args.data.display(),
        write_mode
    );

    let store_options = StoreOptions::default()
        .set_data_file(args.data)
        .set_write_mode(write_mode);

    let guest_service = GuestService::new(Arc::new(GuestStore::new(store_options)));

    guest_service.initialize_storage();

    Server::new(ServerOptions {
        address: args.address,
        port: args.port,
        log_http: args.log_http,
        http_workers: args.http_workers,
    })
    .run(guest_service)
    .await
}
