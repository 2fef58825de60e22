fn main() {
    if let Err(err) = nested_csv_ingest::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
