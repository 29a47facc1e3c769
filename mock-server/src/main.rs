use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "8081".to_string());
    let token =
        std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_else(|_| mock_server::TOKEN.to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("mock bot api listening on {addr}");
    mock_server::run_with_state(listener, mock_server::MockState::new(&token)).await
}
