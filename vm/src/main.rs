use clap::Parser;
use sigrun_runtime::VmConfig;
use tracing_log::log::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    #[arg(
        short = 'c',
        long = "classpath",
        visible_alias = "cp",
        visible_alias = "class-path",
        value_delimiter = ':',
        help = "Classpath entries (directories only); use ':' as separator"
    )]
    pub class_path: Vec<String>,
    #[arg(long = "heap-size-mb", default_value_t = 64, help = "Heap capacity in MiB")]
    pub heap_size_mb: usize,
    #[arg(
        long = "gc-threshold-mb",
        default_value_t = 32,
        help = "Allocated bytes before a safepoint triggers mark-sweep, in MiB"
    )]
    pub gc_threshold_mb: usize,
    #[arg(
        long = "frame-stack-depth",
        default_value_t = 1024,
        help = "Maximum interpreter frame depth"
    )]
    pub frame_stack_depth: usize,
    #[arg(
        help = "Main class to run, matching the package structure \
        (e.g. com.example.Main or com/example/Main for com/example/Main.class)"
    )]
    pub main_class: String,
    #[arg(trailing_var_arg = true, help = "Arguments passed through to main")]
    pub program_args: Vec<String>,
}

fn create_vm_configuration(mut args: Args, main_class: String) -> VmConfig {
    if args.class_path.is_empty() {
        let current_dir = std::env::current_dir()
            .map(|v| v.to_string_lossy().to_string())
            .expect("cannot get current dir");
        args.class_path.push(current_dir);
    }
    VmConfig {
        class_path: args.class_path,
        main_class,
        program_args: args.program_args,
        heap_size_mb: args.heap_size_mb,
        frame_stack_depth: args.frame_stack_depth,
        gc_threshold_mb: args.gc_threshold_mb,
    }
}

fn main() {
    // The fmt subscriber installs the log-facade bridge, so the runtime's
    // log-macro output lands here too.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    debug!("Provided command line arguments: {:?}", args);

    let main_class = args.main_class.replace('.', "/");
    let vm_config = create_vm_configuration(args, main_class);

    if sigrun_runtime::start(vm_config).is_err() {
        std::process::exit(1);
    }
}
