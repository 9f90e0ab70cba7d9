use anyhow::Result;

fn main() -> Result<()> {
    osm_cli::run()
}
