mod object_client;
mod s3_client;

pub use object_client::ObjectClient;
pub use s3_client::{create_s3_client, S3ObjectClient};
