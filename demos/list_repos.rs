use apt_repofind::{repos_to_json, DebianRepoFinder, RepoFinder, SourcesConfig};

fn main() {
    env_logger::init();

    // Optional argument: a root directory such as an image chroot.
    let config = match std::env::args().nth(1) {
        Some(root) => SourcesConfig::with_root(root),
        None => SourcesConfig::default(),
    };
    let finder = DebianRepoFinder::new(config);
    let repos = finder.get_repos().expect("failed to read APT sources");

    println!("=== Repositories ===");
    for repo in &repos {
        println!(
            "{:<24} {} ({})",
            repo.name,
            repo,
            if repo.trusted { "trusted" } else { "untrusted" }
        );
    }

    println!("\n=== JSON ===");
    let json = repos_to_json(&repos, &finder.config().default_arch);
    println!(
        "{}",
        serde_json::to_string_pretty(&json).expect("failed to serialize repositories")
    );
}
