#[tokio::main]
async fn main() {
    let exit_code = open_notebook::app::cli::start().await;
    std::process::exit(exit_code);
}
