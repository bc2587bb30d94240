//! Test fixtures for common test scenarios.
//!
//! Generated-source directories and stand-in compiler scripts.

use std::path::{Path, PathBuf};

/// Fixture for a directory of generated model sources.
#[derive(Debug, Clone)]
pub struct ModuleFixture {
    /// Module name.
    pub name: String,
    /// Files to write (name relative to the directory -> content).
    pub files: Vec<(String, String)>,
}

impl ModuleFixture {
    /// Create an empty fixture.
    pub fn new(name: impl Into<String>) -> Self {
        ModuleFixture {
            name: name.into(),
            files: Vec::new(),
        }
    }

    /// A Fortran module plus the shared `functionmodule.f90`.
    pub fn fortran(name: impl Into<String>) -> Self {
        let name = name.into();
        let module = sources::fortran_module(&name);
        ModuleFixture::new(name.clone())
            .with_file("functionmodule.f90", sources::function_module())
            .with_file(format!("{}.f90", name), module)
    }

    /// A single C source.
    pub fn c(name: impl Into<String>) -> Self {
        let name = name.into();
        let source = sources::c_module(&name);
        ModuleFixture::new(name.clone()).with_file(format!("{}.c", name), source)
    }

    /// Add a file.
    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.push((name.into(), content.into()));
        self
    }

    /// Write all files into `dir`.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        for (name, content) in &self.files {
            std::fs::write(dir.join(name), content)?;
        }
        Ok(dir.to_path_buf())
    }
}

/// Source templates shaped like generated model code.
pub mod sources {
    /// Helper functions compiled into every Fortran module.
    pub fn function_module() -> &'static str {
        r#"module functionmodule
    implicit none
contains
    pure function sign_of(x) result(s)
        real(kind=8), intent(in) :: x
        real(kind=8) :: s
        s = sign(1.0d0, x)
    end function sign_of
end module functionmodule
"#
    }

    /// A Fortran model exporting one subroutine.
    pub fn fortran_module(name: &str) -> String {
        format!(
            r#"subroutine {name}_der_state(t, q, qd)
    use functionmodule
    implicit none
    real(kind=8), intent(in) :: t
    real(kind=8), dimension(2), intent(in) :: q
    real(kind=8), dimension(2), intent(out) :: qd
    qd(1) = q(2)
    qd(2) = -9.81d0 * sin(q(1)) + 0.0d0 * t
end subroutine {name}_der_state
"#
        )
    }

    /// A C model exporting one function.
    pub fn c_module(name: &str) -> String {
        format!(
            r#"#include <math.h>

#ifdef _WIN32
#define EXPORT __declspec(dllexport)
#else
#define EXPORT
#endif

EXPORT void {name}_der_state(double t, const double *q, double *qd)
{{
    qd[0] = q[1];
    qd[1] = -9.81 * sin(q[0]) + 0.0 * t;
}}
"#
        )
    }

    /// C source that does not compile.
    pub fn invalid_c() -> &'static str {
        "void broken(void) { return 1 }\n"
    }
}

/// Stand-in compiler scripts for exercising the real process runner.
#[cfg(unix)]
pub mod stubs {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Write an executable shell script named `name` into `dir`.
    pub fn write_script(dir: &Path, name: &str, body: &str) -> std::io::Result<PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}", body))?;
        let mut perms = std::fs::metadata(&path)?.permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms)?;
        Ok(path)
    }

    /// A C compiler that creates its `-o` target.
    pub fn gcc(dir: &Path) -> std::io::Result<PathBuf> {
        write_script(
            dir,
            "stub-gcc",
            r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then
    shift
    out="$1"
  fi
  shift
done
echo "stub-gcc: linking $out"
: > "$out"
"#,
        )
    }

    /// A C compiler that reports an error and exits 1.
    pub fn failing_gcc(dir: &Path) -> std::io::Result<PathBuf> {
        write_script(
            dir,
            "failing-gcc",
            r#"echo "broken.c:1:30: error: expected ';' before '}' token" >&2
exit 1
"#,
        )
    }

    /// An f2py that builds `<module>.cpython-stub.so` for its `-m` argument.
    pub fn f2py(dir: &Path) -> std::io::Result<PathBuf> {
        write_script(
            dir,
            "stub-f2py",
            r#"module=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-m" ]; then
    shift
    module="$1"
  fi
  shift
done
echo "Reading fortran codes..."
echo "Building modules..."
: > "$module.cpython-stub.so"
"#,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fortran_fixture() {
        let fixture = ModuleFixture::fortran("pendulum");
        let names: Vec<_> = fixture.files.iter().map(|(n, _)| n.as_str()).collect();

        assert_eq!(names, vec!["functionmodule.f90", "pendulum.f90"]);
        assert!(fixture.files[1].1.contains("pendulum_der_state"));
    }

    #[test]
    fn test_fixture_write_to() {
        let tmp = TempDir::new().unwrap();
        let dir = ModuleFixture::c("crane").write_to(&tmp.path().join("gen")).unwrap();

        assert!(dir.join("crane.c").is_file());
    }
}
