use anyhow::Result;

fn main() -> Result<()> {
    targuard::cli::run()
}
