mod platform;

fn main() -> anyhow::Result<()> {
    let project = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("COHORT_PROJECT").ok())
        .and_then(|value| value.parse::<u64>().ok());

    let Some(project) = project else {
        eprintln!("usage: cohort_app <project-id>");
        std::process::exit(2);
    };

    platform::run_app(project)
}
