use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    preinscription::cli::main()
}
