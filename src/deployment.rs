//! Parameters of the deployed batch stack
//!
//! These mirror what the infrastructure definition provisions so that the
//! handler and the worker agree with it on names, paths and limits. Nothing here
//! creates resources.

/// Network layout: one AZ, a public and a private /17, one NAT gateway
pub mod network {
    pub const VPC_CIDR: &str = "10.0.0.0/16";
    pub const MAX_AZS: u8 = 1;
    pub const SUBNET_CIDR_MASK: u8 = 17;
    pub const NAT_GATEWAYS: u8 = 1;
}

/// Lustre file system shared by all workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSystemSpec {
    pub storage_capacity_gib: u32,
    pub deployment_type: &'static str,
    pub auto_import_policy: &'static str,
    /// Bucket prefix imported into the filesystem
    pub import_prefix: &'static str,
    /// Lustre client port range opened to the filesystem security group
    pub lustre_ports: (u16, u16),
    pub mount_point: &'static str,
}

pub const FILE_SYSTEM: FileSystemSpec = FileSystemSpec {
    storage_capacity_gib: 1200,
    deployment_type: "SCRATCH_2",
    auto_import_policy: "NEW_CHANGED_DELETED",
    import_prefix: "input",
    lustre_ports: (988, 1023),
    mount_point: "/fsx",
};

impl FileSystemSpec {
    /// S3 location imported into the filesystem
    pub fn import_path(&self, bucket: &str) -> String {
        format!("s3://{}/{}", bucket, self.import_prefix)
    }

    /// S3 location exports are written back to
    pub fn export_path(&self, bucket: &str) -> String {
        format!("s3://{}", bucket)
    }

    pub fn allows_port(&self, port: u16) -> bool {
        (self.lustre_ports.0..=self.lustre_ports.1).contains(&port)
    }
}

/// Managed spot compute environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeEnvironmentSpec {
    pub name: &'static str,
    pub resource_type: &'static str,
    pub allocation_strategy: &'static str,
    pub bid_percentage: u8,
    pub min_vcpus: u32,
    pub max_vcpus: u32,
    pub desired_vcpus: u32,
    pub instance_types: &'static [&'static str],
}

pub const COMPUTE_ENVIRONMENT: ComputeEnvironmentSpec = ComputeEnvironmentSpec {
    name: "Batch-Actuary-Computing",
    resource_type: "SPOT",
    allocation_strategy: "SPOT_CAPACITY_OPTIMIZED",
    bid_percentage: 100,
    min_vcpus: 0,
    max_vcpus: 320,
    desired_vcpus: 0,
    instance_types: &["optimal"],
};

pub const JOB_QUEUE_NAME: &str = "actuary-computing-job-queue";

/// Container job every worker runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobDefinitionSpec {
    pub name: &'static str,
    pub vcpus: u32,
    pub memory_mib: u32,
    pub retry_attempts: u32,
    pub host_path: &'static str,
    pub container_path: &'static str,
    pub input_dir: &'static str,
    pub output_dir: &'static str,
}

pub const JOB_DEFINITION: JobDefinitionSpec = JobDefinitionSpec {
    name: "actuary-computing-job-definition",
    vcpus: 2,
    memory_mib: 7168,
    retry_attempts: 3,
    host_path: "/fsx",
    container_path: "/fsx",
    input_dir: "/fsx/input",
    output_dir: "/fsx/output",
};

impl JobDefinitionSpec {
    /// Parallel workers the compute environment can run at its vCPU ceiling
    pub fn max_concurrent_jobs(&self, environment: &ComputeEnvironmentSpec) -> u32 {
        environment.max_vcpus / self.vcpus
    }
}

/// EventBridge rule that invokes the completion handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRuleSpec {
    pub source: &'static str,
    pub detail_type: &'static str,
    pub status: &'static str,
}

pub const COMPLETION_RULE: EventRuleSpec = EventRuleSpec {
    source: "aws.batch",
    detail_type: "Batch Job State Change",
    status: "SUCCEEDED",
};

/// Lambda timeout of the completion handler
pub const HANDLER_TIMEOUT_SECS: u64 = 180;

/// Export path the handler is configured with
pub const EXPORT_PATH: &str = "output/";

/// Cloud-config for the launch template: install the Lustre client and mount the
/// filesystem where the job definition expects it
pub fn launch_template_user_data(file_system_id: &str, region: &str, mount_name: &str) -> String {
    format!(
        "MIME-Version: 1.0\n\
         Content-Type: multipart/mixed; boundary=\"==MYBOUNDARY==\"\n\
         \n\
         --==MYBOUNDARY==\n\
         Content-Type: text/cloud-config; charset=\"us-ascii\"\n\
         \n\
         runcmd:\n\
         - amazon-linux-extras install -y lustre2.10\n\
         - mkdir -p {mount}\n\
         - mount -t lustre -o noatime,flock {fs}.fsx.{region}.amazonaws.com@tcp:/{name} {mount}\n\
         \n\
         --==MYBOUNDARY==--",
        mount = FILE_SYSTEM.mount_point,
        fs = file_system_id,
        region = region,
        name = mount_name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};

    #[test]
    fn test_user_data_mounts_filesystem() {
        let data = launch_template_user_data("fs-0abc", "eu-west-1", "x7d2abmv");
        assert!(data.contains("mkdir -p /fsx\n"));
        assert!(data.contains(
            "mount -t lustre -o noatime,flock fs-0abc.fsx.eu-west-1.amazonaws.com@tcp:/x7d2abmv /fsx\n"
        ));
        assert!(data.ends_with("--==MYBOUNDARY==--"));
    }

    #[test]
    fn test_paths_line_up() {
        assert_eq!(JOB_DEFINITION.host_path, FILE_SYSTEM.mount_point);
        assert!(JOB_DEFINITION.input_dir.ends_with(FILE_SYSTEM.import_prefix));
        assert!(JOB_DEFINITION.output_dir.ends_with(EXPORT_PATH.trim_end_matches('/')));
        assert_eq!(FILE_SYSTEM.import_path("bucket"), "s3://bucket/input");
        assert_eq!(FILE_SYSTEM.export_path("bucket"), "s3://bucket");
    }

    #[test]
    fn test_default_poll_budget_fits_handler_timeout() {
        let budget = DEFAULT_POLL_INTERVAL.as_secs() * DEFAULT_MAX_POLL_ATTEMPTS as u64;
        assert!(budget < HANDLER_TIMEOUT_SECS);
    }

    #[test]
    fn test_subnets_fill_vpc() {
        let vpc_mask: u32 = network::VPC_CIDR.rsplit('/').next().unwrap().parse().unwrap();
        let subnet_size = 1u64 << (32 - network::SUBNET_CIDR_MASK as u32);
        // one public and one private subnet per AZ
        let used = subnet_size * 2 * network::MAX_AZS as u64;
        assert_eq!(used, 1u64 << (32 - vpc_mask));
        assert_eq!(network::NAT_GATEWAYS, network::MAX_AZS);
    }

    #[test]
    fn test_capacity() {
        assert_eq!(JOB_DEFINITION.max_concurrent_jobs(&COMPUTE_ENVIRONMENT), 160);
        assert!(FILE_SYSTEM.allows_port(988));
        assert!(!FILE_SYSTEM.allows_port(2049));
    }
}
