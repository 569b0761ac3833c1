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
    use k8s_openapi::api::apps::v1::Deployment;
    use kbcli::cli::action::{execute, Factory};
    use kbcli::cli::class::ClassListCommand;
    use kbcli::cli::cluster::create::ClusterCreateCommand;
    use kbcli::cli::cluster::ClusterCommand;
    use kbcli::cli::migration::{MigrationListCommand, TerminateCommand};
    use kbcli::cli::version::VersionCommand;
    use kbcli::cli::{CliArgs, Commands};
    use kbcli::testing::{context, object, FakeClient};
    use kbcli::Gvr;
    use serde_json::json;
    use std::sync::Arc;

    fn factory(client: &FakeClient) -> Factory {
        Factory::with_client(Arc::new(client.clone()), "default")
    }

    fn cluster_definition() -> kube::api::DynamicObject {
        object(json!({
            "apiVersion": "apps.kubeblocks.io/v1alpha1",
            "kind": "ClusterDefinition",
            "metadata": {"name": "apecloud-mysql"},
            "spec": {"componentDefs": [{"name": "mysql", "characterType": "mysql"}]}
        }))
    }

    fn migration_crd() -> kube::api::DynamicObject {
        object(json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": {"name": "migrationtasks.datamigration.apecloud.io"}
        }))
    }

    fn migration_task(name: &str) -> kube::api::DynamicObject {
        object(json!({
            "apiVersion": "datamigration.apecloud.io/v1alpha1",
            "kind": "MigrationTask",
            "metadata": {
                "name": name,
                "namespace": "default",
                "creationTimestamp": "2023-06-01T00:00:00Z"
            },
            "spec": {
                "sourceEndpoint": {"endpointType": "MySQL", "address": "10.0.0.1:3306"},
                "sinkEndpoint": {"endpointType": "MySQL", "address": "10.0.0.2:3306"}
            },
            "status": {"taskStatus": "Running"}
        }))
    }

    #[test]
    fn test_cluster_aliases() {
        let args = CliArgs::parse_from(["kbcli", "cluster", "ls-backups", "mycluster"]);
        assert!(matches!(
            args.command,
            Commands::Cluster(ClusterCommand::ListBackups(_))
        ));
        let args = CliArgs::parse_from(["kbcli", "cluster", "rv", "c", "--name", "u", "-r", "readonly"]);
        assert!(matches!(
            args.command,
            Commands::Cluster(ClusterCommand::RevokeRole(_))
        ));
        let args = CliArgs::parse_from(["kbcli", "cluster", "edit-bp", "p", "--set", "pathPrefix=/x"]);
        assert!(matches!(
            args.command,
            Commands::Cluster(ClusterCommand::EditBackupPolicy(_))
        ));
    }

    #[tokio::test]
    async fn test_create_cluster() {
        let client = FakeClient::new().with_object(&Gvr::cluster_definition(), cluster_definition());
        let (mut ctx, out) = context(factory(&client));
        let mut cmd = ClusterCreateCommand::parse_from([
            "create",
            "mycluster",
            "--cluster-definition",
            "apecloud-mysql",
            "--set",
            "cpu=2,memory=4Gi,replicas=3",
        ]);
        execute(&mut cmd, &mut ctx).await.unwrap();

        assert_eq!(
            client.writes(),
            vec![
                "create serviceaccounts default/kb-mycluster".to_string(),
                "create clusters default/mycluster".to_string(),
            ]
        );
        let cluster = client.stored(&Gvr::cluster(), "default", "mycluster").unwrap();
        let component = &cluster.data["spec"]["componentSpecs"][0];
        assert_eq!(component["replicas"], 3);
        assert_eq!(component["resources"]["limits"]["memory"], "4Gi");
        assert_eq!(
            cluster.metadata.labels.unwrap()["clusterdefinition.kubeblocks.io/name"],
            "apecloud-mysql"
        );
        assert_eq!(out.contents(), "Cluster mycluster created\n");
    }

    #[tokio::test]
    async fn test_create_cluster_cleans_up_on_failure() {
        let client = FakeClient::new()
            .with_object(&Gvr::cluster_definition(), cluster_definition())
            .failing_create(&Gvr::cluster());
        let (mut ctx, _out) = context(factory(&client));
        let mut cmd = ClusterCreateCommand::parse_from([
            "create",
            "mycluster",
            "--cluster-definition",
            "apecloud-mysql",
        ]);
        let err = execute(&mut cmd, &mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("admission webhook denied"));
        assert_eq!(
            client.writes(),
            vec![
                "create serviceaccounts default/kb-mycluster".to_string(),
                "create clusters default/mycluster".to_string(),
                "delete serviceaccounts default/kb-mycluster".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_create_cluster_failure_keeps_existing_service_account() {
        let existing = object(json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {"name": "kb-mycluster", "namespace": "default"}
        }));
        let client = FakeClient::new()
            .with_object(&Gvr::cluster_definition(), cluster_definition())
            .with_object(&Gvr::service_account(), existing)
            .failing_create(&Gvr::cluster());
        let (mut ctx, _out) = context(factory(&client));
        let mut cmd = ClusterCreateCommand::parse_from([
            "create",
            "mycluster",
            "--cluster-definition",
            "apecloud-mysql",
        ]);
        let err = execute(&mut cmd, &mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("admission webhook denied"));
        assert_eq!(
            client.writes(),
            vec![
                "create serviceaccounts default/kb-mycluster".to_string(),
                "create clusters default/mycluster".to_string(),
            ]
        );
        assert!(client
            .stored(&Gvr::service_account(), "default", "kb-mycluster")
            .is_some());
    }

    #[tokio::test]
    async fn test_create_cluster_dry_run() {
        let client = FakeClient::new().with_object(&Gvr::cluster_definition(), cluster_definition());
        let (mut ctx, out) = context(factory(&client));
        let mut cmd = ClusterCreateCommand::parse_from([
            "create",
            "mycluster",
            "--cluster-definition",
            "apecloud-mysql",
            "--dry-run",
            "-o",
            "json",
        ]);
        execute(&mut cmd, &mut ctx).await.unwrap();

        assert!(client.writes().is_empty());
        let value: serde_json::Value = serde_json::from_str(&out.contents()).unwrap();
        assert_eq!(value["kind"], "Cluster");
        assert_eq!(
            value["metadata"]["labels"]["clusterdefinition.kubeblocks.io/name"],
            "apecloud-mysql"
        );
    }

    #[tokio::test]
    async fn test_create_cluster_validation() {
        let client = FakeClient::new().with_object(&Gvr::cluster_definition(), cluster_definition());
        let (mut ctx, _out) = context(factory(&client));
        let mut cmd = ClusterCreateCommand::parse_from([
            "create",
            "mycluster",
            "--cluster-definition",
            "apecloud-mysql",
            "--termination-policy",
            "Never",
        ]);
        let err = execute(&mut cmd, &mut ctx).await.unwrap_err();
        assert!(err.to_string().starts_with("invalid termination policy \"Never\""));

        let mut cmd = ClusterCreateCommand::parse_from(["create", "mycluster"]);
        let err = execute(&mut cmd, &mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("--cluster-definition"));
        assert!(client.writes().is_empty());
    }

    #[tokio::test]
    async fn test_class_list_sorted_and_normalized() {
        let client = FakeClient::new().with_object(
            &Gvr::component_class_definition(),
            object(json!({
                "apiVersion": "apps.kubeblocks.io/v1alpha1",
                "kind": "ComponentClassDefinition",
                "metadata": {
                    "name": "kb.classes.default.apecloud-mysql.mysql",
                    "labels": {
                        "clusterdefinition.kubeblocks.io/name": "apecloud-mysql",
                        "apps.kubeblocks.io/component-def-ref": "mysql"
                    }
                },
                "status": {"classes": [
                    {"name": "general-2c4g", "cpu": "2", "memory": "4Gi"},
                    {"name": "general-1c1g", "cpu": "1", "memory": "1Gi"},
                    {"name": "general-1c512m", "cpu": "1", "memory": "512Mi"}
                ]}
            })),
        );
        let (mut ctx, out) = context(factory(&client));
        let mut cmd = ClassListCommand::parse_from([
            "list",
            "--cluster-definition",
            "apecloud-mysql",
        ]);
        execute(&mut cmd, &mut ctx).await.unwrap();

        let text = out.contents();
        let pos = |needle: &str| text.find(needle).unwrap();
        assert!(pos("general-1c512m") < pos("general-1c1g"));
        assert!(pos("general-1c1g") < pos("general-2c4g"));
        assert!(text.contains("512Mi"));
    }

    #[tokio::test]
    async fn test_version() {
        let deploy: Deployment = serde_json::from_value(json!({
            "metadata": {
                "name": "kubeblocks",
                "namespace": "kb-system",
                "labels": {
                    "app.kubernetes.io/name": "kubeblocks",
                    "app.kubernetes.io/component": "apps",
                    "app.kubernetes.io/version": "0.7.0"
                }
            }
        }))
        .unwrap();
        let client = FakeClient::new().with_deployment(deploy);
        let (mut ctx, out) = context(factory(&client));
        let mut cmd = VersionCommand::default();
        execute(&mut cmd, &mut ctx).await.unwrap();
        assert_eq!(
            out.contents(),
            format!(
                "Kubernetes: v1.30.0\nKubeBlocks: 0.7.0\nkbcli: {}\n",
                env!("CARGO_PKG_VERSION")
            )
        );
    }

    #[tokio::test]
    async fn test_migration_requires_crd() {
        let client = FakeClient::new().with_object(&Gvr::migration_task(), migration_task("m1"));
        let (mut ctx, _out) = context(factory(&client));
        let mut cmd = MigrationListCommand::parse_from(["list"]);
        let err = execute(&mut cmd, &mut ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "datamigration crd is not installed");
    }

    #[tokio::test]
    async fn test_migration_list_and_terminate() {
        let client = FakeClient::new()
            .with_object(&Gvr::crd(), migration_crd())
            .with_object(&Gvr::migration_task(), migration_task("m1"));
        let (mut ctx, out) = context(factory(&client));

        let mut list = MigrationListCommand::parse_from(["list"]);
        execute(&mut list, &mut ctx).await.unwrap();
        let text = out.contents();
        assert!(text.contains("m1"));
        assert!(text.contains("MySQL(10.0.0.1:3306)"));
        assert!(text.contains("Running"));

        let mut terminate = TerminateCommand::parse_from(["terminate", "m1", "--auto-approve"]);
        execute(&mut terminate, &mut ctx).await.unwrap();
        assert_eq!(
            client.writes(),
            vec!["delete migrationtasks default/m1".to_string()]
        );
    }
}
