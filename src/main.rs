use clap::Parser;

use yespower_opt::{Hasher, Params, Version};

#[derive(Clone, Copy, clap::ValueEnum)]
enum Variant {
    /// yespower 1.0
    #[value(name = "1.0")]
    V1_0,
    /// yescrypt 0.5
    #[value(name = "0.5")]
    V0_5,
}

impl From<Variant> for Version {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::V1_0 => Version::V1_0,
            Variant::V0_5 => Version::V0_5,
        }
    }
}

#[derive(Parser)]
#[command(version, about = "yespower / yescrypt-0.5 proof-of-work hash")]
struct Args {
    /// Hex-encoded input message (typically an 80-byte block header).
    input: Option<String>,

    #[arg(long, value_enum, default_value = "1.0")]
    variant: Variant,

    /// N value
    #[arg(short, long, default_value = "2048")]
    n: u32,

    /// R value
    #[arg(short, long, default_value = "32")]
    r: u32,

    /// Personalization token (raw bytes)
    #[arg(long, default_value = "")]
    pers: String,

    /// Run the algorithmic self-test and exit
    #[arg(long)]
    self_test: bool,
}

fn main() -> std::process::ExitCode {
    let args = Args::parse();

    if args.self_test {
        yespower_opt::self_test::algorithm_self_test();
        println!("self-test passed");
        return std::process::ExitCode::SUCCESS;
    }

    let Some(input_hex) = args.input.as_deref() else {
        eprintln!("no input given (expected a hex string)");
        return std::process::ExitCode::FAILURE;
    };

    let input = match hex::decode(input_hex) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("invalid input hex: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    let params = Params::new(args.variant.into(), args.n, args.r);
    let mut hasher = match Hasher::new(params) {
        Ok(hasher) => hasher,
        Err(e) => {
            eprintln!("{e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    let digest = hasher.hash(&input, args.pers.as_bytes());
    println!("{}", hex::encode(digest));

    std::process::ExitCode::SUCCESS
}
