use clean_kitchen_gateway::{start_server, Gateway, GatewayConfig};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = GatewayConfig::load()?;

    match args.get(1).map(String::as_str) {
        None | Some("serve") => start_server(config).await?,
        Some("query") => {
            let query = args
                .get(2)
                .ok_or("Please provide a query string, e.g. \"q=pasta&limit=5\"")?;
            let gateway = Gateway::from_config(&config)?;
            println!("{}", gateway.query_json(query).await?);
        }
        Some(other) => {
            return Err(format!("Unknown command '{}'. Use 'serve' or 'query'", other).into())
        }
    }

    Ok(())
}
