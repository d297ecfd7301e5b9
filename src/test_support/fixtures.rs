//! Test fixtures shared by the unit tests.

use std::path::Path;

use crate::core::dependency::{DependencyTable, ResolvedDependency};

/// A small recipe touching every resolver feature: bool, single and multi
/// options, a guarded option, ordered conflicts, guarded dependencies,
/// a threaded decision table, environment rules and target rules.
pub const SAMPLE_RECIPE: &str = r#"
[package]
name = "sample"
description = "Fixture recipe"
versions = ["2.0", "develop", "2.1"]

[[option]]
name = "mpi"
default = true
description = "Enable MPI support"

[[option]]
name = "openmp"
flag = "open-mp"

[[option]]
name = "linalg"
kind = "single"
values = ["none", "parallel"]
default = "none"
branches.parallel = ["--enable-par-linalg", "--with-scalapack-libs={scalapack.libs}"]

[[option]]
name = "cuda"

[[option]]
name = "arch"
kind = "single"
values = ["70", "80"]
when = "+cuda"

[[option]]
name = "profile"
kind = "multi"
values = ["time", "memory"]
default = ["time"]
flags.time = { enable = "--enable-time-profile", disable = "--disable-time-profile" }

[[option]]
name = "mkl"

[[conflict]]
id = "cuda-requires-non-gcc-compiler"
when = "+cuda %gcc"
message = "CUDA builds need the nvhpc or pgi compilers"

[[conflict]]
id = "parallel-linalg-requires-mpi"
when = "linalg=parallel ~mpi"
message = "Parallel linear algebra available only with +mpi"

[[dependency]]
name = "mpi"
when = "+mpi"

[[dependency]]
name = "scalapack"
when = "linalg=parallel"

[[dependency]]
name = "blas"

[[dependency]]
name = "cuda"
version = "10:"
when = "+cuda"

[[configure]]
option = "mpi"

[[configure]]
option = "openmp"

[[configure]]
option = "linalg"

[[configure]]
option = "profile"

[[configure]]
when = "+cuda"
args = ["--enable-cuda=cuda{cuda.version},cc{options.arch}"]

[[configure]]
table = "blas"

[[configure]]
when = "@develop"
args = ["--enable-devel"]

[[table]]
name = "blas"
threading = "openmp"

[[table.row]]
family = "intel"
threaded = true
when = "+mkl"
args = ["--with-blas-libs=-lmkl_intel_lp64 -lmkl_intel_thread -lmkl_core"]

[[table.row]]
family = "intel"
threaded = false
when = "+mkl"
args = ["--with-blas-libs=-lmkl_intel_lp64 -lmkl_sequential -lmkl_core"]

[[table.row]]
when = "~mkl"
args = ["--with-blas-libs={blas.libs}"]

[[environment.rule]]
when = "^openmpi"
set = { MPICC = "{mpi.mpicc}", MPIFC = "mpif90" }

[[environment.rule]]
when = "%nvhpc"
set = { MPICC = "mpicc" }
unset = ["CPP"]

[build]
targets = ["core"]
parallel = false

[[build.target-rule]]
when = "profile=memory"
targets = ["memprof"]

[[build.target-rule]]
when = "+cuda"
targets = ["gpu", "core"]

[install]
method = "copy"
trees = [{ from = "bin", to = "bin" }]
"#;

/// Dependencies satisfying every non-CUDA requirement of [`SAMPLE_RECIPE`].
pub fn sample_deps() -> DependencyTable {
    let mut deps = DependencyTable::new();
    deps.insert(
        "mpi",
        ResolvedDependency::provided_by("openmpi")
            .with_version("4.1.1".parse().expect("valid version"))
            .with_prefix("/opt/openmpi")
            .with_extra("mpicc", "/opt/openmpi/bin/mpicc"),
    );
    deps.insert(
        "scalapack",
        ResolvedDependency::provided_by("netlib-scalapack")
            .with_prefix("/opt/scalapack")
            .with_libs("-L/opt/scalapack/lib -lscalapack"),
    );
    deps.insert(
        "blas",
        ResolvedDependency::provided_by("openblas")
            .with_prefix("/opt/openblas")
            .with_libs("-L/opt/openblas/lib -lopenblas"),
    );
    deps
}

/// Write [`SAMPLE_RECIPE`] into `dir` and return its path.
pub fn write_sample_recipe(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("sample.toml");
    std::fs::write(&path, SAMPLE_RECIPE).expect("failed to write sample recipe");
    path
}
