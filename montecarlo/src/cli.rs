use crate::{
    Analyzer, Face, FaceCounts, OutcomeCounts, Shape, Trial, WeightedDie, DEFAULT_NUM_DICE,
    DEFAULT_NUM_ROLLS,
};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::{
    fmt,
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};
use tabular::{row, Table};
use trice::Instant;

///////////////////////////
// String parser helpers //
///////////////////////////

fn parse_req<T>(label: &'static str, s: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    T::from_str(s).map_err(|err| format!("invalid {label}: {err}"))
}

fn parse_opt<T>(label: &'static str, opt_s: Option<&str>) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    opt_s
        .map(T::from_str)
        .transpose()
        .map_err(|err| format!("invalid {label}: {err}"))
}

//////////////////////
// CLI Args Wrapper //
//////////////////////

pub struct Args(pico_args::Arguments);

impl Args {
    pub fn new(inner: pico_args::Arguments) -> Self {
        Self(inner)
    }

    fn subcommand(&mut self) -> Result<Option<String>, String> {
        self.0.subcommand().map_err(|err| err.to_string())
    }

    fn opt_value(&mut self, keys: impl Into<pico_args::Keys>) -> Result<Option<String>, String> {
        self.0
            .opt_value_from_fn(keys, |s| Result::<_, pico_args::Error>::Ok(s.to_owned()))
            .map_err(|err| err.to_string())
    }

    fn values(&mut self, keys: impl Into<pico_args::Keys>) -> Result<Vec<String>, String> {
        self.0
            .values_from_fn(keys, |s| Result::<_, pico_args::Error>::Ok(s.to_owned()))
            .map_err(|err| err.to_string())
    }

    fn expect_finished(self) -> Result<(), String> {
        let remaining = self.0.finish();
        if !remaining.is_empty() {
            Err(format!("unexpected arguments left: '{:?}'", remaining))
        } else {
            Ok(())
        }
    }

    fn maybe_help(&mut self, usage: &str) {
        if self.0.contains(["-h", "--help"]) {
            print!("{}", usage);
            std::process::exit(0);
        }
    }
}

/////////////
// Metrics //
/////////////

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Metrics(pub Vec<(String, String)>);

impl Metrics {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, label: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.push((label.into(), value.into()));
        self
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new("{:>}  {:<}");

        for (label, value) in &self.0 {
            table.add_row(row!(label, value));
        }

        table
    }
}

///////////////////
// Command trait //
///////////////////

pub trait Command: Sized {
    const USAGE: &'static str;

    type Output: fmt::Display;

    fn try_from_cli_args(args: Args) -> Result<Self, String>;
    fn run(self) -> Result<Self::Output, String>;
}

////////////////
// Experiment //
////////////////

/// A weight override applied to every die, parsed from `face=weight`.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightArg {
    face: Face,
    weight: String,
}

impl FromStr for WeightArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (face, weight) = s
            .split_once('=')
            .ok_or_else(|| format!("expected 'face=weight', got '{s}'"))?;
        Ok(Self {
            face: parse_req("face", face.trim())?,
            weight: weight.to_owned(),
        })
    }
}

/// The parameters shared by every subcommand: the dice to build, how many
/// times to roll them, and the RNG seed.
#[derive(Clone, Debug)]
pub struct Experiment {
    faces: Vec<Face>,
    ndice: usize,
    nrolls: usize,
    weights: Vec<WeightArg>,
    seed: u64,
}

impl Experiment {
    const OPTIONS: &'static str = "    --faces <a,b,c>     comma separated die faces (integers or text)
    --dice <n>          number of similar dice to roll (default: 2)
    --rolls <n>         number of times to roll the dice (default: 10)
    --weight <face=w>   set a face's weight on every die, repeatable
    --seed <u64>        RNG seed (default: from the clock)
";

    fn try_from_cli_args(args: &mut Args) -> Result<Self, String> {
        let faces = args
            .opt_value("--faces")?
            .ok_or_else(|| "missing required option '--faces'".to_string())?;
        let ndice = args.opt_value("--dice")?;
        let nrolls = args.opt_value("--rolls")?;
        let weights = args.values("--weight")?;
        let seed = args.opt_value("--seed")?;

        Self::try_from_str_args(
            &faces,
            ndice.as_deref(),
            nrolls.as_deref(),
            &weights,
            seed.as_deref(),
        )
    }

    pub fn try_from_str_args(
        faces: &str,
        ndice: Option<&str>,
        nrolls: Option<&str>,
        weights: &[String],
        seed: Option<&str>,
    ) -> Result<Self, String> {
        let faces = faces
            .split(',')
            .map(|face| parse_req::<Face>("face", face.trim()))
            .collect::<Result<Vec<_>, _>>()?;

        let weights = weights
            .iter()
            .map(|weight| parse_req::<WeightArg>("weight", weight))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            faces,
            ndice: parse_opt("number of dice", ndice)?.unwrap_or(DEFAULT_NUM_DICE),
            nrolls: parse_opt("number of rolls", nrolls)?.unwrap_or(DEFAULT_NUM_ROLLS),
            weights,
            seed: parse_opt("seed", seed)?.unwrap_or_else(clock_seed),
        })
    }

    /// Build the dice and play a single roll batch.
    fn play(&self) -> Result<Trial, String> {
        let mut die = WeightedDie::new(self.faces.clone()).map_err(|err| err.to_string())?;
        for WeightArg { face, weight } in &self.weights {
            die.set_weight_str(face, weight)
                .map_err(|err| err.to_string())?;
        }

        let mut trial = Trial::new(vec![die; self.ndice]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        trial
            .play_rolls(&mut rng, self.nrolls)
            .map_err(|err| err.to_string())?;

        Ok(trial)
    }

    fn metrics(&self) -> Metrics {
        let mut metrics = Metrics::new();
        metrics.push("dice", self.ndice.to_string());
        metrics.push("rolls", self.nrolls.to_string());
        metrics.push("seed", self.seed.to_string());
        metrics
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0)
}

/////////////////
// RollCommand //
/////////////////

#[derive(Clone, Debug)]
pub struct RollCommand {
    experiment: Experiment,
    shape: Shape,
}

impl Command for RollCommand {
    const USAGE: &'static str = "\
montecarlo roll - roll some similar dice and print the result table

USAGE:
    montecarlo roll --faces <a,b,c> [option ...]

OPTIONS:
    --shape <wide|narrow>  layout of the result table (default: wide)
";

    type Output = String;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(&format!("{}{}", Self::USAGE, Experiment::OPTIONS));

        let experiment = Experiment::try_from_cli_args(&mut args)?;
        let shape = args.opt_value("--shape")?;
        let shape = parse_opt("shape", shape.as_deref())?.unwrap_or_default();

        args.expect_finished()?;
        Ok(Self { experiment, shape })
    }

    fn run(self) -> Result<Self::Output, String> {
        let trial = self.experiment.play()?;
        let result = trial.result(self.shape).map_err(|err| err.to_string())?;

        Ok(format!("\n{}\n{}", result, self.experiment.metrics().to_table()))
    }
}

////////////////////
// AnalyzeCommand //
////////////////////

#[derive(Clone, Debug)]
pub struct AnalyzeCommand {
    experiment: Experiment,
}

impl Command for AnalyzeCommand {
    const USAGE: &'static str = "\
montecarlo analyze - roll some similar dice and describe the outcome

USAGE:
    montecarlo analyze --faces <a,b,c> [option ...]

OPTIONS:
";

    type Output = AnalyzeCommandOutput;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(&format!("{}{}", Self::USAGE, Experiment::OPTIONS));

        let experiment = Experiment::try_from_cli_args(&mut args)?;

        args.expect_finished()?;
        Ok(Self { experiment })
    }

    fn run(self) -> Result<Self::Output, String> {
        let trial = self.experiment.play()?;
        let analyzer = Analyzer::new(&trial);

        let start_time = Instant::now();
        let jackpots = analyzer.jackpot_count().map_err(|err| err.to_string())?;
        let face_counts = analyzer
            .face_counts_per_roll()
            .map_err(|err| err.to_string())?;
        let combinations = analyzer
            .combination_count()
            .map_err(|err| err.to_string())?;
        let permutations = analyzer
            .permutation_count()
            .map_err(|err| err.to_string())?;
        let analyze_duration = start_time.elapsed();

        let mut metrics = self.experiment.metrics();
        metrics.push("jackpots", jackpots.to_string());
        metrics.push("analyze_duration", format!("{:.2?}", analyze_duration));

        Ok(AnalyzeCommandOutput {
            face_counts,
            combinations,
            permutations,
            metrics,
        })
    }
}

pub struct AnalyzeCommandOutput {
    face_counts: FaceCounts,
    combinations: OutcomeCounts,
    permutations: OutcomeCounts,
    metrics: Metrics,
}

impl fmt::Display for AnalyzeCommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nface counts per roll:\n{}", self.face_counts)?;
        writeln!(f, "combinations:\n{}", self.combinations)?;
        writeln!(f, "permutations:\n{}", self.permutations)?;
        write!(f, "{}", self.metrics.to_table())
    }
}

/////////////////
// BaseCommand //
/////////////////

#[derive(Debug)]
pub enum BaseCommand {
    Roll(RollCommand),
    Analyze(AnalyzeCommand),
}

impl Command for BaseCommand {
    const USAGE: &'static str = "\
montecarlo - roll weighted dice and describe the outcome

USAGE:
    montecarlo [option ...] <subcommand>

SUBCOMMANDS:
    · montecarlo roll - roll some similar dice and print the result table
    · montecarlo analyze - jackpots, face counts, combinations, and permutations
";

    type Output = String;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        let maybe_subcommand = args.subcommand()?;

        match maybe_subcommand.as_deref() {
            Some("roll") => Ok(Self::Roll(RollCommand::try_from_cli_args(args)?)),
            Some("analyze") => Ok(Self::Analyze(AnalyzeCommand::try_from_cli_args(args)?)),
            Some(command) => Err(format!("'{}' is not a recognized command", command)),
            None => {
                args.maybe_help(Self::USAGE);
                Err("no subcommand specified".to_string())
            }
        }
    }

    fn run(self) -> Result<String, String> {
        match self {
            Self::Roll(cmd) => cmd.run(),
            Self::Analyze(cmd) => cmd.run().map(|out| out.to_string()),
        }
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod test {
    use super::*;
    use claim::{assert_err, assert_ok};
    use std::ffi::OsString;

    fn args(argv: &[&str]) -> Args {
        Args::new(pico_args::Arguments::from_vec(
            argv.iter().map(|&arg| OsString::from(arg)).collect(),
        ))
    }

    #[test]
    fn test_weight_arg_from_str() {
        let arg = "a=2.5".parse::<WeightArg>().unwrap();
        assert_eq!(Face::from("a"), arg.face);
        assert_eq!("2.5", arg.weight);

        let arg = "3=1".parse::<WeightArg>().unwrap();
        assert_eq!(Face::Int(3), arg.face);

        assert_err!("a".parse::<WeightArg>());
    }

    #[test]
    fn test_experiment_from_str_args() {
        let experiment = Experiment::try_from_str_args(
            "1, 2, 3,a,b,c",
            None,
            Some("3"),
            &["a=6".to_string()],
            Some("42"),
        )
        .unwrap();

        assert_eq!(6, experiment.faces.len());
        assert_eq!(Face::Int(2), experiment.faces[1]);
        assert_eq!(DEFAULT_NUM_DICE, experiment.ndice);
        assert_eq!(3, experiment.nrolls);
        assert_eq!(42, experiment.seed);

        let trial = experiment.play().unwrap();
        assert_eq!(Some(6.0), trial.dice()[1].weight(&Face::from("a")));
        assert_eq!(3, trial.wide().unwrap().nrolls());

        assert_err!(Experiment::try_from_str_args("1,2", Some("x"), None, &[], None));
    }

    #[test]
    fn test_experiment_play_errors() {
        // duplicate faces
        let experiment = Experiment::try_from_str_args("1,1", None, None, &[], Some("1")).unwrap();
        assert_err!(experiment.play());

        // unknown face in a weight
        let weights = ["z=2".to_string()];
        let experiment = Experiment::try_from_str_args("1,2", None, None, &weights, Some("1")).unwrap();
        assert_err!(experiment.play());

        // zero rolls
        let experiment = Experiment::try_from_str_args("1,2", None, Some("0"), &[], Some("1")).unwrap();
        assert_err!(experiment.play());
    }

    #[test]
    fn test_base_command() {
        let cmd = BaseCommand::try_from_cli_args(args(&[
            "roll", "--faces", "1,2,3", "--rolls", "4", "--seed", "7", "--shape", "narrow",
        ]))
        .unwrap();
        assert_ok!(cmd.run());

        let cmd = BaseCommand::try_from_cli_args(args(&[
            "analyze", "--faces", "a,b", "--dice", "3", "--weight", "a=2", "--weight", "b=0.5",
        ]))
        .unwrap();
        let out = cmd.run().unwrap();
        assert!(out.contains("combinations:"));
        assert!(out.contains("jackpots"));

        assert_err!(BaseCommand::try_from_cli_args(args(&["juggle"])));
        assert_err!(BaseCommand::try_from_cli_args(args(&["roll", "--rolls", "3"])));
        assert_err!(BaseCommand::try_from_cli_args(args(&[
            "roll", "--faces", "1,2", "--shape", "tall"
        ])));
    }
}
