fn main() -> anyhow::Result<()> {
    csv_sieve::run()
}
