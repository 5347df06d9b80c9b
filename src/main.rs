fn main() -> anyhow::Result<()> {
    stickies::cli::run()
}
