fn main() -> anyhow::Result<()> {
    reprise::runtime::run()
}
