use anyhow::Result;

fn main() -> Result<()> {
    grid_diff::cli::run()
}
