pub mod config;
pub mod converter;
pub mod process;
pub mod queue;
pub mod storage;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
    SanitizedConfig,
};
pub use converter::{
    AthenaConverter, ConversionOutput, ConversionRequest, ConversionSource, Converter,
    ConverterError, RenderOptions, RendererConfig, StagedUpload, UploadingConverter,
};
pub use process::{CommandRunner, ProcessError, ProcessRunner};
pub use queue::{ErrorKind, JobError, JobHandle, JobId, PoolConfig, PoolStatus, WorkerPool};
pub use storage::{ObjectStore, S3Store, StorageError, StoredObject, UploadConfig};
