use crate::discovery::{Discovery, OperatorPrompt, StdinPrompt};
use crate::environment::{Backend, Environment};
use crate::kube::{api, ControlPlane, KubeAgent, Kubectl};
use crate::render::ClientConfig;
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod discovery;
mod environment;
mod kube;
mod render;
mod retry;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    // Diagnostics go to stderr, stdout only carries the share links.
    // Set RUST_LOG environment variable to control log levels
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    info!("Generating V2Ray client configuration");

    let env = Environment::new();

    let succeeded = match env.backend {
        Backend::Kubectl => {
            let kubectl = Kubectl::new(
                env.kubectl_bin.clone(),
                env.retry.clone(),
                env.command_timeout,
            );
            run(kubectl, &mut StdinPrompt, &env).await
        }
        Backend::Api => {
            let certificate = match &env.kube_ca_cert {
                Some(path) => match api::load_certificate(path) {
                    Ok(cert) => Some(cert),
                    Err(e) => {
                        warn!("Ignoring CA certificate {}: {}", path.display(), e);
                        None
                    }
                },
                None => None,
            };

            match KubeAgent::new(
                env.kube_api_server.clone(),
                env.kube_token.clone(),
                certificate,
                env.retry.clone(),
                env.command_timeout,
            ) {
                Ok(agent) => run(agent, &mut StdinPrompt, &env).await,
                Err(e) => {
                    error!("Failed to initialize Kubernetes API client: {}", e);
                    false
                }
            }
        }
    };

    if !succeeded {
        std::process::exit(1);
    }
}

async fn run<C: ControlPlane, P: OperatorPrompt>(
    cluster: C,
    prompt: &mut P,
    env: &Environment,
) -> bool {
    let discovery = Discovery::new(cluster, env.discovery.clone());

    let addresses = discovery.discover_addresses(prompt).await;
    if addresses.is_empty() {
        error!("No node addresses found, no client configuration written");
        return false;
    }

    let params = discovery.discover_parameters().await;

    let config = match ClientConfig::from_addresses(&addresses, &params) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to build client configuration: {}", e);
            return false;
        }
    };

    if let Err(e) = config.write_to(&env.output_file).await {
        error!("{}", e);
        return false;
    }

    println!(
        "Wrote {} server configs to {}",
        config.servers.len(),
        env.output_file.display()
    );

    for (i, server) in config.servers.iter().enumerate() {
        match render::ShareLink::for_record(server) {
            Ok(link) => println!("Server {}: {}", i + 1, link),
            Err(e) => {
                error!("Failed to encode share link for {}: {}", server.address, e);
                return false;
            }
        }
    }

    true
}
