use indicatif::{ProgressBar, ProgressStyle};

/// キャッシュ探索の進捗表示
pub struct DiscoveryProgress {
    progress_bar: ProgressBar,
}

impl DiscoveryProgress {
    pub fn new(image: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        pb.set_message(format!("Searching registry cache for {}...", image));

        Self { progress_bar: pb }
    }

    pub fn probing(&self, n: usize, max: usize, candidate: &str) {
        self.progress_bar
            .set_message(format!("({}/{}) {} を確認中...", n, max, candidate));
    }

    pub fn finish_found(&self, spec: &str) {
        self.progress_bar
            .finish_with_message(format!("Cache found: {}", spec));
    }

    pub fn finish_none(&self) {
        self.progress_bar.finish_with_message("No cache image found");
    }
}
