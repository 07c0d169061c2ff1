use std::sync::Arc;

use actix_web::web;
use infrastructure_architecture::background_service::BackgroundService;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::api;
use crate::infrastructure::{config::build_config, telemetry, ServiceProvider};

pub fn run() {
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(x) => x,
        Err(e) => return eprintln!("Cannot build runtime: {e}"),
    };
    runtime.block_on(async_run());
}

pub async fn async_run() {
    let config = match build_config() {
        Ok(x) => x,
        Err(e) => {
            return eprintln!("Cannot build config: {e}");
        }
    };

    let service_provider = match ServiceProvider::build(config).await {
        Ok(x) => Arc::new(x),
        Err(e) => {
            return eprintln!("Cannot build Service Provider: {e:?}");
        }
    };
    if let Err(e) = telemetry::initialize_telemetry(&service_provider.config.telemetry) {
        return eprintln!("Cannot build logger: {e}");
    };
    let tasks: Vec<Arc<dyn BackgroundService>> = service_provider.background_services();
    let handles = tasks
        .into_iter()
        .map(|x| tokio::spawn(async move { x.run().await }))
        .collect::<Vec<JoinHandle<()>>>();
    tokio::select! {
        _ = initialize_web_host(service_provider.clone()) => {
            service_provider.shutdown();
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Stopping services (ctrl-c handling).");
            service_provider.shutdown();
        }
    }
    // The dispatcher drains its workers, the watcher loops until aborted.
    let grace = tokio::time::sleep(std::time::Duration::from_secs(10));
    tokio::pin!(grace);
    for mut handle in handles {
        tokio::select! {
            _ = &mut handle => {}
            _ = &mut grace => handle.abort(),
        }
    }
    info!("Services stopped.");
}

pub async fn initialize_web_host(sp: Arc<ServiceProvider>) {
    let host = sp.config.host.clone();
    let server = actix_web::HttpServer::new(move || {
        let cors = actix_cors::Cors::default()
            .allow_any_origin()
            .allow_any_header()
            .allow_any_method()
            .max_age(86400);

        actix_web::App::new()
            .wrap(cors)
            .app_data(web::Data::from(sp.clone()))
            .service(
                web::scope("")
                    .service(api::ticket::create_ticket)
                    .service(api::ticket::update_ticket)
                    .service(api::ticket::submit_ticket)
                    .service(api::ticket::check_auto_audit)
                    .service(api::ticket::audit_ticket)
                    .service(api::ticket::approve_ticket)
                    .service(api::ticket::cancel_ticket_itsm)
                    .service(api::ticket::create_upgrade_ticket)
                    .service(api::ticket::get_ticket)
                    .service(api::ticket::get_audit_info)
                    .service(api::order::start_order)
                    .service(api::order::pause_order)
                    .service(api::order::terminate_order)
                    .service(api::order::modify_order)
                    .service(api::order::cancel_crp)
                    .service(api::order::deliver_devices)
                    .service(api::order::run_disk_check)
                    .service(api::order::get_suborders)
                    .service(api::order::get_steps)
                    .service(api::order::get_modify_records),
            )
    });
    let server = match server.bind((host.bind_address.to_owned(), host.bind_port)) {
        Ok(x) => x,
        Err(e) => return error!("Cannot bind {}:{}: {e}", host.bind_address, host.bind_port),
    };
    info!("Listening on {}:{}.", host.bind_address, host.bind_port);
    match server.disable_signals().run().await {
        Ok(_) => info!("Web server stopped successfully."),
        Err(e) => error!("Web server into error: {}", e),
    }
}
