//! `nativemod fortran` command

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::cli::FortranArgs;
use nativemod::core::ModuleLanguage;
use nativemod::ops::BuildOptions;
use nativemod::util::Shell;

pub async fn execute(args: FortranArgs, shell: &Arc<Shell>) -> Result<()> {
    let mut options = BuildOptions::new(ModuleLanguage::Fortran, args.module, args.dir);
    options.compiler_override = args.compiler;
    options.timeout = args.timeout.map(Duration::from_secs);

    // f2py failures are warnings unless --strict.
    super::build::run(options, shell, args.strict).await
}
