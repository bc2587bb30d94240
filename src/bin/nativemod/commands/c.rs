//! `nativemod c` command

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::cli::CArgs;
use nativemod::core::ModuleLanguage;
use nativemod::ops::BuildOptions;
use nativemod::util::Shell;

pub async fn execute(args: CArgs, shell: &Arc<Shell>) -> Result<()> {
    let mut options = BuildOptions::new(ModuleLanguage::C, args.module, args.dir);
    options.timeout = args.timeout.map(Duration::from_secs);

    super::build::run(options, shell, true).await
}
