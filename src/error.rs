use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("AWS EC2 error: {0}")]
    AwsEc2(#[from] aws_sdk_ec2::Error),

    #[error("AWS Auto Scaling error: {0}")]
    AwsAutoScaling(#[from] aws_sdk_autoscaling::Error),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("deadline exceeded waiting for {0}")]
    DeadlineExceeded(String),

    #[error("no compatible spot candidate for instance type {0}")]
    NoCompatibleCandidate(String),

    #[error("other error: {0}")]
    Other(String),
}

impl<E> From<aws_sdk_ec2::error::SdkError<E>> for Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: aws_sdk_ec2::error::SdkError<E>) -> Self {
        Error::Other(err.to_string())
    }
}

impl<E> From<aws_sdk_autoscaling::error::SdkError<E>> for Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: aws_sdk_autoscaling::error::SdkError<E>) -> Self {
        Error::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
