//! Application errors and exit codes.

use std::process::ExitCode;

use shapes_gpu::{ErrorKind, GpuError};
use shapes_platform::PlatformError;
use thiserror::Error;

/// Anything that can end the application early.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Process exit status for this error.
    ///
    /// 1: windowing, 2: resource creation, 3: capability mismatch,
    /// 4: submit/acquire/present.
    pub fn code(&self) -> u8 {
        match self {
            Self::Platform(_) => 1,
            Self::Gpu(e) => match e.kind() {
                ErrorKind::ResourceCreation => 2,
                ErrorKind::CapabilityMismatch => 3,
                ErrorKind::RuntimeSubmit => 4,
            },
        }
    }

    /// [`AppError::code`] as an [`ExitCode`].
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk;

    #[test]
    fn exit_codes_follow_error_kind() {
        let cases = [
            (AppError::from(PlatformError::EventLoop("gone".into())), 1),
            (
                AppError::from(GpuError::ResourceCreation {
                    what: "framebuffer",
                    result: vk::Result::ERROR_OUT_OF_HOST_MEMORY,
                }),
                2,
            ),
            (AppError::from(GpuError::NoSuitableDevice), 3),
            (
                AppError::from(GpuError::Submit(vk::Result::ERROR_DEVICE_LOST)),
                4,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code, "{err}");
        }
    }
}
