use clap::Parser;
use log::info;

use tabula::api::TabulaApi;
use tabula::conf::Config;
use tabula::core::{CliArgs, TabulaError, setup_logging};
use tabula::service::TabulaService;
use tabula::store::DirStore;

#[tokio::main]
async fn main() -> Result<(), TabulaError> {
    setup_logging();
    let args = CliArgs::parse();
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    info!(args; "Tabula started.");

    let store = DirStore::new(&config.store.data_dir)?;
    let service = TabulaService::new(Box::new(store));
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("listening on {addr}");
    TabulaApi::new(service).serve(&addr).await
}
