use montecarlo::cli::{Args, BaseCommand, Command};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::new(pico_args::Arguments::from_env());

    let result = BaseCommand::try_from_cli_args(args).and_then(BaseCommand::run);

    match result {
        Ok(out) => println!("{}", out),
        Err(err) => {
            eprintln!("error: {}", err);
            eprintln!("Try 'montecarlo --help' for more information.");
            std::process::exit(1);
        }
    }
}
