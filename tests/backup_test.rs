// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#[cfg(test)]
mod tests {
    use clap::Parser;
    use k8s_openapi::api::batch::v1::Job;
    use k8s_openapi::api::core::v1::{Event, Pod};
    use kbcli::cli::action::{execute, Factory};
    use kbcli::cli::cluster::backup::{
        BackupCommand, DeleteBackupCommand, DescribeBackupCommand, ListBackupsCommand,
        RestoreCommand,
    };
    use kbcli::testing::{context, object, FakeClient};
    use kbcli::Gvr;
    use serde_json::json;
    use std::sync::Arc;

    fn cluster(name: &str) -> kube::api::DynamicObject {
        object(json!({
            "apiVersion": "apps.kubeblocks.io/v1alpha1",
            "kind": "Cluster",
            "metadata": {"name": name, "namespace": "default"},
            "spec": {"clusterDefinitionRef": "apecloud-mysql", "componentSpecs": [
                {"name": "mysql", "componentDefRef": "mysql"}
            ]}
        }))
    }

    fn policy(name: &str, cluster: &str, methods: serde_json::Value) -> kube::api::DynamicObject {
        object(json!({
            "apiVersion": "dataprotection.kubeblocks.io/v1alpha1",
            "kind": "BackupPolicy",
            "metadata": {
                "name": name,
                "namespace": "default",
                "labels": {"app.kubernetes.io/instance": cluster},
                "annotations": {"dataprotection.kubeblocks.io/is-default-policy": "true"}
            },
            "spec": {"backupMethods": methods},
            "status": {"phase": "Available"}
        }))
    }

    fn backup(name: &str, cluster: &str, phase: &str, created: &str) -> kube::api::DynamicObject {
        object(json!({
            "apiVersion": "dataprotection.kubeblocks.io/v1alpha1",
            "kind": "Backup",
            "metadata": {
                "name": name,
                "namespace": "default",
                "creationTimestamp": created,
                "labels": {"app.kubernetes.io/instance": cluster}
            },
            "spec": {"backupMethod": "xtrabackup", "backupPolicyName": "mycluster-policy"},
            "status": {"phase": phase}
        }))
    }

    fn fixture() -> FakeClient {
        FakeClient::new()
            .with_object(&Gvr::cluster(), cluster("mycluster"))
            .with_object(
                &Gvr::backup_policy(),
                policy(
                    "mycluster-policy",
                    "mycluster",
                    json!([{"name": "xtrabackup", "actionSetName": "xtrabackup-mysql"}]),
                ),
            )
    }

    fn factory(client: &FakeClient) -> Factory {
        Factory::with_client(Arc::new(client.clone()), "default")
    }

    #[tokio::test]
    async fn test_backup_uses_defaults() {
        let client = fixture();
        let (mut ctx, out) = context(factory(&client));
        let mut cmd = BackupCommand::parse_from(["backup", "mycluster"]);
        execute(&mut cmd, &mut ctx).await.unwrap();

        assert!(cmd.name.starts_with("backup-default-mycluster-"));
        assert_eq!(cmd.name.len(), "backup-default-mycluster-".len() + 14);
        assert_eq!(cmd.policy, "mycluster-policy");
        assert_eq!(cmd.method, "xtrabackup");

        let writes = client.writes();
        assert_eq!(writes, vec![format!("create opsrequests default/{}", cmd.name)]);
        let ops = client
            .stored(&Gvr::ops_request(), "default", &cmd.name)
            .unwrap();
        assert_eq!(ops.data["spec"]["type"], "Backup");
        assert_eq!(ops.data["spec"]["backupSpec"]["backupMethod"], "xtrabackup");
        assert!(out
            .contents()
            .contains(&format!("Backup {} created successfully", cmd.name)));
    }

    #[tokio::test]
    async fn test_incremental_backup_with_completed_parent() {
        let client = FakeClient::new()
            .with_object(&Gvr::cluster(), cluster("mycluster"))
            .with_object(
                &Gvr::backup_policy(),
                policy(
                    "my-policy",
                    "mycluster",
                    json!([
                        {"name": "xtrabackup"},
                        {"name": "volume-snapshot", "snapshotVolumes": true}
                    ]),
                ),
            )
            .with_object(
                &Gvr::backup(),
                backup("parent1", "mycluster", "Completed", "2023-06-01T00:00:00Z"),
            );
        let (mut ctx, _out) = context(factory(&client));
        let mut cmd = BackupCommand::parse_from([
            "backup",
            "mycluster",
            "--method",
            "volume-snapshot",
            "--policy",
            "my-policy",
            "--parent-backup",
            "parent1",
        ]);
        execute(&mut cmd, &mut ctx).await.unwrap();

        assert!(cmd.name.starts_with("backup-default-mycluster-"));
        let ops = client
            .stored(&Gvr::ops_request(), "default", &cmd.name)
            .unwrap();
        assert_eq!(ops.data["spec"]["backupSpec"]["parentBackupName"], "parent1");
        assert_eq!(ops.data["spec"]["backupSpec"]["backupPolicyName"], "my-policy");
    }

    #[tokio::test]
    async fn test_backup_rejects_unknown_method() {
        let client = fixture();
        let (mut ctx, _out) = context(factory(&client));
        let mut cmd = BackupCommand::parse_from(["backup", "mycluster", "--method", "snapshot"]);
        let err = execute(&mut cmd, &mut ctx).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "backup method \"snapshot\" is not defined in backup policy \"mycluster-policy\""
        );
        assert!(client.writes().is_empty());
    }

    #[tokio::test]
    async fn test_backup_parent_must_be_completed() {
        let client = fixture().with_object(
            &Gvr::backup(),
            backup("parent", "mycluster", "Running", "2023-06-01T00:00:00Z"),
        );
        let (mut ctx, _out) = context(factory(&client));
        let mut cmd =
            BackupCommand::parse_from(["backup", "mycluster", "--parent-backup", "parent"]);
        let err = execute(&mut cmd, &mut ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "parent backup parent is not completed");
        assert!(client.writes().is_empty());
    }

    #[tokio::test]
    async fn test_backup_parent_must_belong_to_cluster() {
        let client = fixture().with_object(
            &Gvr::backup(),
            backup("parent", "othercluster", "Completed", "2023-06-01T00:00:00Z"),
        );
        let (mut ctx, _out) = context(factory(&client));
        let mut cmd =
            BackupCommand::parse_from(["backup", "mycluster", "--parent-backup", "parent"]);
        let err = execute(&mut cmd, &mut ctx).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "parent backup parent is not belong to cluster mycluster"
        );
        assert!(client.writes().is_empty());
    }

    #[tokio::test]
    async fn test_backup_invalid_deletion_policy() {
        let client = fixture();
        let (mut ctx, _out) = context(factory(&client));
        let mut cmd =
            BackupCommand::parse_from(["backup", "mycluster", "--deletion-policy", "Keep"]);
        let err = execute(&mut cmd, &mut ctx).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid deletion policy \"Keep\", supported values: [Delete, Retain]"
        );
    }

    #[tokio::test]
    async fn test_list_backups_sorted_and_filtered() {
        let client = FakeClient::new()
            .with_object(&Gvr::backup(), backup("b-new", "c1", "Completed", "2023-06-03T00:00:00Z"))
            .with_object(&Gvr::backup(), backup("b-old", "c1", "Completed", "2023-06-01T00:00:00Z"))
            .with_object(&Gvr::backup(), backup("b-other", "c2", "Failed", "2023-06-02T00:00:00Z"));
        let (mut ctx, out) = context(factory(&client));
        let mut cmd = ListBackupsCommand::parse_from(["list-backups", "c1"]);
        execute(&mut cmd, &mut ctx).await.unwrap();

        let text = out.contents();
        assert!(text.lines().next().unwrap().contains("SOURCE-CLUSTER"));
        let old = text.find("b-old").unwrap();
        let new = text.find("b-new").unwrap();
        assert!(old < new);
        assert!(!text.contains("b-other"));
    }

    #[tokio::test]
    async fn test_list_backups_name_filter_and_empty() {
        let client = FakeClient::new()
            .with_object(&Gvr::backup(), backup("b1", "c1", "Completed", "2023-06-01T00:00:00Z"))
            .with_object(&Gvr::backup(), backup("b2", "c1", "Completed", "2023-06-02T00:00:00Z"));
        let (mut ctx, out) = context(factory(&client));
        let mut cmd = ListBackupsCommand::parse_from(["list-backups", "--name", "b2"]);
        execute(&mut cmd, &mut ctx).await.unwrap();
        let text = out.contents();
        assert!(text.contains("b2"));
        assert!(!text.contains("b1"));

        let (mut ctx, out) = context(factory(&FakeClient::new()));
        let mut cmd = ListBackupsCommand::parse_from(["list-backups"]);
        execute(&mut cmd, &mut ctx).await.unwrap();
        assert_eq!(out.contents(), "No backups found in default namespace.\n");
    }

    #[tokio::test]
    async fn test_list_backups_field_selector() {
        let client = FakeClient::new()
            .with_object(&Gvr::backup(), backup("b1", "c1", "Completed", "2023-06-01T00:00:00Z"))
            .with_object(&Gvr::backup(), backup("b2", "c1", "Completed", "2023-06-02T00:00:00Z"));
        let (mut ctx, out) = context(factory(&client));
        let mut cmd = ListBackupsCommand::parse_from([
            "list-backups",
            "--field-selector",
            "metadata.name=b1",
        ]);
        execute(&mut cmd, &mut ctx).await.unwrap();
        let text = out.contents();
        assert!(text.contains("b1"));
        assert!(!text.contains("b2"));
    }

    #[tokio::test]
    async fn test_list_backups_json_passthrough() {
        let client = FakeClient::new()
            .with_object(&Gvr::backup(), backup("b1", "c1", "Completed", "2023-06-01T00:00:00Z"));
        let (mut ctx, out) = context(factory(&client));
        let mut cmd = ListBackupsCommand::parse_from(["list-backups", "-o", "json"]);
        execute(&mut cmd, &mut ctx).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&out.contents()).unwrap();
        assert_eq!(value["items"][0]["metadata"]["name"], "b1");
        assert_eq!(value["items"][0]["status"]["phase"], "Completed");
    }

    #[tokio::test]
    async fn test_delete_backup_requires_name() {
        let client = FakeClient::new();
        let (mut ctx, _out) = context(factory(&client));
        let mut cmd = DeleteBackupCommand::parse_from(["delete-backup", "mycluster"]);
        let err = execute(&mut cmd, &mut ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing --name as backup name.");

        let mut cmd =
            DeleteBackupCommand::parse_from(["delete-backup", "a", "b", "--name", "b1"]);
        let err = execute(&mut cmd, &mut ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "Only supported delete the Backup of one cluster");
        assert!(client.writes().is_empty());
    }

    #[tokio::test]
    async fn test_delete_backup_force_by_cluster() {
        let client = FakeClient::new()
            .with_object(&Gvr::backup(), backup("b1", "c1", "Completed", "2023-06-01T00:00:00Z"))
            .with_object(&Gvr::backup(), backup("b2", "c2", "Completed", "2023-06-02T00:00:00Z"));
        let (mut ctx, _out) = context(factory(&client));
        let mut cmd = DeleteBackupCommand::parse_from(["delete-backup", "c1", "--force"]);
        execute(&mut cmd, &mut ctx).await.unwrap();
        assert_eq!(client.writes(), vec!["delete backups default/b1".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_backup_stops_at_first_failure() {
        let client = FakeClient::new()
            .with_object(&Gvr::backup(), backup("b1", "c1", "Completed", "2023-06-01T00:00:00Z"))
            .with_object(&Gvr::backup(), backup("b3", "c1", "Completed", "2023-06-03T00:00:00Z"));
        let (mut ctx, out) = context(factory(&client));
        let mut cmd = DeleteBackupCommand::parse_from([
            "delete-backup",
            "c1",
            "--name",
            "b1,b2,b3",
        ]);
        let err = execute(&mut cmd, &mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("\"b2\" not found"));
        assert_eq!(
            client.writes(),
            vec![
                "delete backups default/b1".to_string(),
                "delete backups default/b2".to_string(),
            ]
        );
        assert!(client.stored(&Gvr::backup(), "default", "b3").is_some());
        assert_eq!(out.contents(), "backups b1 deleted\n");
    }

    #[tokio::test]
    async fn test_restore_requires_completed_backup() {
        let client = FakeClient::new()
            .with_object(&Gvr::backup(), backup("b1", "c1", "Failed", "2023-06-01T00:00:00Z"));
        let (mut ctx, _out) = context(factory(&client));
        let mut cmd = RestoreCommand::parse_from(["restore", "restored", "--backup", "b1"]);
        let err = execute(&mut cmd, &mut ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "backup b1 is not completed");
        assert!(client.writes().is_empty());
    }

    #[tokio::test]
    async fn test_restore_generates_cluster_name() {
        let client = FakeClient::new()
            .with_object(&Gvr::backup(), backup("b1", "c1", "Completed", "2023-06-01T00:00:00Z"));
        let (mut ctx, out) = context(factory(&client));
        let mut cmd = RestoreCommand::parse_from([
            "restore",
            "--backup",
            "b1",
            "--volume-restore-policy",
            "Serial",
        ]);
        execute(&mut cmd, &mut ctx).await.unwrap();

        let name = cmd.name.clone().unwrap();
        assert!(name.starts_with("cluster-"));
        let ops = client.stored(&Gvr::ops_request(), "default", &name).unwrap();
        assert_eq!(ops.data["spec"]["type"], "Restore");
        assert_eq!(ops.data["spec"]["restoreSpec"]["backupName"], "b1");
        assert_eq!(out.contents(), format!("Cluster {} created\n", name));
    }

    #[tokio::test]
    async fn test_restore_missing_backup_flag() {
        let (mut ctx, _out) = context(factory(&FakeClient::new()));
        let mut cmd = RestoreCommand::parse_from(["restore", "restored"]);
        let err = execute(&mut cmd, &mut ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "must be specified one of the --backup");
    }

    #[tokio::test]
    async fn test_describe_failed_backup_with_logs() {
        let mut failed = backup("b1", "c1", "Failed", "2023-06-01T00:00:00Z");
        failed.data["status"]["failureReason"] = json!("job failed");

        let job: Job = serde_json::from_value(json!({
            "metadata": {
                "name": "b1-job",
                "namespace": "default",
                "uid": "uid-1",
                "labels": {"dataprotection.kubeblocks.io/backup-name": "b1"}
            },
            "status": {"failed": 1}
        }))
        .unwrap();
        let pod: Pod = serde_json::from_value(json!({
            "metadata": {
                "name": "b1-job-abcde",
                "namespace": "default",
                "labels": {"controller-uid": "uid-1"}
            }
        }))
        .unwrap();

        let client = FakeClient::new()
            .with_object(&Gvr::backup(), failed)
            .with_job(job)
            .with_pod(pod)
            .with_logs("b1-job-abcde", "xtrabackup: error 42");
        let (mut ctx, out) = context(factory(&client));
        let mut cmd = DescribeBackupCommand::parse_from(["describe-backup", "b1"]);
        execute(&mut cmd, &mut ctx).await.unwrap();

        let text = out.contents();
        assert!(text.contains("Name: b1\tCluster: c1\tNamespace: default"));
        assert!(text.contains("Failure Reason:"));
        assert!(text.contains("job failed"));
        assert!(text.contains("pod b1-job-abcde error logs:"));
        assert!(text.contains("xtrabackup: error 42"));
    }

    fn event(name: &str, type_: &str, reason: &str, message: &str) -> Event {
        serde_json::from_value(json!({
            "metadata": {"name": name, "namespace": "default"},
            "involvedObject": {"kind": "Backup", "name": "b1", "namespace": "default"},
            "type": type_,
            "reason": reason,
            "message": message,
            "lastTimestamp": "2023-06-01T00:05:00Z"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_describe_backup_prints_only_warning_events() {
        let client = FakeClient::new()
            .with_object(&Gvr::backup(), backup("b1", "c1", "Completed", "2023-06-01T00:00:00Z"))
            .with_event(event("e1", "Warning", "BackupFailed", "snapshot quota exceeded"))
            .with_event(event("e2", "Normal", "Created", "backup job created"));
        let (mut ctx, out) = context(factory(&client));
        let mut cmd = DescribeBackupCommand::parse_from(["describe-backup", "b1"]);
        execute(&mut cmd, &mut ctx).await.unwrap();

        let text = out.contents();
        assert!(client.calls().contains(&"list events default/b1".to_string()));
        assert!(text.contains("Warning Events:"));
        assert!(!text.contains("<none>"));
        assert!(text.contains("BackupFailed"));
        assert!(text.contains("snapshot quota exceeded"));
        assert!(text.contains("Backup/b1"));
        assert!(!text.contains("backup job created"));
    }
}
