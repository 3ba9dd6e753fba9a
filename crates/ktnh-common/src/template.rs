//! CloudFormation template generation
//!
//! The generated stack keeps a database stopped: RDS restarts a stopped
//! database after seven days and emits an event when it does, an EventBridge
//! rule forwards that event to a Step Functions state machine, and the state
//! machine waits until the database is `available` before stopping it again.
//!
//! Only long-form intrinsic functions (`Fn::Sub`, `Fn::GetAtt`) are used so
//! the body stays plain YAML and parses back with [`parse_template_metadata`].
//!
//! [`parse_template_metadata`]: crate::metadata::parse_template_metadata

use crate::db_kind::DatabaseKind;
use crate::defaults::{GENERATOR_NAME, GENERATOR_VERSION};
use tracing::debug;

/// Seconds the state machine waits between status checks
const STATUS_POLL_SECONDS: u32 = 300;

const TEMPLATE: &str = r#"AWSTemplateFormatVersion: '2010-09-09'
Description: 'Keeps the {{KIND_LABEL}} "{{DB_IDENTIFIER}}" stopped (generated by {{GENERATOR}})'
Metadata:
  KTNH:
    Generator: '{{GENERATOR}}'
    Version: '{{VERSION}}'
    DBIdentifier: '{{DB_IDENTIFIER}}'
    DBType: '{{DB_TYPE}}'
Resources:
  StateMachineRole:
    Type: 'AWS::IAM::Role'
    Properties:
      RoleName: 'ktnh-{{DB_IDENTIFIER_SHORT}}-{{QUALIFIER}}-sfn'
      AssumeRolePolicyDocument:
        Version: '2012-10-17'
        Statement:
          - Effect: 'Allow'
            Principal:
              Service: 'states.amazonaws.com'
            Action: 'sts:AssumeRole'
      Policies:
        - PolicyName: 'stop-db'
          PolicyDocument:
            Version: '2012-10-17'
            Statement:
              - Effect: 'Allow'
                Action:
                  - 'rds:{{DESCRIBE_ACTION}}'
                  - 'rds:{{STOP_ACTION}}'
                Resource:
                  Fn::Sub: 'arn:${AWS::Partition}:rds:${AWS::Region}:${AWS::AccountId}:{{ARN_TYPE}}:{{DB_IDENTIFIER}}'
  StateMachine:
    Type: 'AWS::StepFunctions::StateMachine'
    Properties:
      StateMachineName: 'ktnh-{{DB_IDENTIFIER_SHORT}}-{{QUALIFIER}}'
      RoleArn:
        Fn::GetAtt: ['StateMachineRole', 'Arn']
      Definition:
        Comment: 'Stop {{DB_IDENTIFIER}} once it becomes available'
        StartAt: 'Describe'
        States:
          Describe:
            Type: 'Task'
            Resource: 'arn:aws:states:::aws-sdk:rds:{{DESCRIBE_SDK_ACTION}}'
            Parameters:
              {{IDENTIFIER_PARAM}}: '{{DB_IDENTIFIER}}'
            ResultSelector:
              Status.$: '{{STATUS_PATH}}'
            Next: 'CheckStatus'
          CheckStatus:
            Type: 'Choice'
            Choices:
              - Variable: '$.Status'
                StringEquals: 'available'
                Next: 'Stop'
              - Variable: '$.Status'
                StringEquals: 'stopped'
                Next: 'Done'
            Default: 'Wait'
          Wait:
            Type: 'Wait'
            Seconds: {{POLL_SECONDS}}
            Next: 'Describe'
          Stop:
            Type: 'Task'
            Resource: 'arn:aws:states:::aws-sdk:rds:{{STOP_SDK_ACTION}}'
            Parameters:
              {{IDENTIFIER_PARAM}}: '{{DB_IDENTIFIER}}'
            End: true
          Done:
            Type: 'Succeed'
  EventRuleRole:
    Type: 'AWS::IAM::Role'
    Properties:
      RoleName: 'ktnh-{{DB_IDENTIFIER_SHORT}}-{{QUALIFIER}}-events'
      AssumeRolePolicyDocument:
        Version: '2012-10-17'
        Statement:
          - Effect: 'Allow'
            Principal:
              Service: 'events.amazonaws.com'
            Action: 'sts:AssumeRole'
      Policies:
        - PolicyName: 'start-execution'
          PolicyDocument:
            Version: '2012-10-17'
            Statement:
              - Effect: 'Allow'
                Action: 'states:StartExecution'
                Resource:
                  Fn::GetAtt: ['StateMachine', 'Arn']
  AutoStartRule:
    Type: 'AWS::Events::Rule'
    Properties:
      Description: 'RDS started {{DB_IDENTIFIER}} after the maximum stopped period'
      EventPattern:
        source:
          - 'aws.rds'
        detail-type:
          - '{{EVENT_DETAIL_TYPE}}'
        detail:
          SourceIdentifier:
            - '{{DB_IDENTIFIER}}'
          EventID:
            - '{{EVENT_ID}}'
      Targets:
        - Id: 'stop-db'
          Arn:
            Fn::GetAtt: ['StateMachine', 'Arn']
          RoleArn:
            Fn::GetAtt: ['EventRuleRole', 'Arn']
"#;

/// Kind-specific values substituted into [`TEMPLATE`]
struct KindParams {
    label: &'static str,
    describe_action: &'static str,
    stop_action: &'static str,
    describe_sdk_action: &'static str,
    stop_sdk_action: &'static str,
    identifier_param: &'static str,
    status_path: &'static str,
    event_detail_type: &'static str,
    event_id: &'static str,
}

impl KindParams {
    fn for_kind(kind: DatabaseKind) -> Self {
        match kind {
            DatabaseKind::Cluster => Self {
                label: "Aurora cluster",
                describe_action: "DescribeDBClusters",
                stop_action: "StopDBCluster",
                describe_sdk_action: "describeDBClusters",
                stop_sdk_action: "stopDBCluster",
                identifier_param: "DbClusterIdentifier",
                status_path: "$.DbClusters[0].Status",
                event_detail_type: "RDS DB Cluster Event",
                event_id: "RDS-EVENT-0153",
            },
            DatabaseKind::Instance => Self {
                label: "RDS instance",
                describe_action: "DescribeDBInstances",
                stop_action: "StopDBInstance",
                describe_sdk_action: "describeDBInstances",
                stop_sdk_action: "stopDBInstance",
                identifier_param: "DbInstanceIdentifier",
                status_path: "$.DbInstances[0].DbInstanceStatus",
                event_detail_type: "RDS DB Instance Event",
                event_id: "RDS-EVENT-0154",
            },
        }
    }
}

/// Render the CloudFormation template body for one database.
pub fn generate_template_body(
    db_identifier: &str,
    db_identifier_short: &str,
    kind: DatabaseKind,
    qualifier: &str,
) -> String {
    debug!(
        db_identifier = %db_identifier,
        db_identifier_short = %db_identifier_short,
        db_type = %kind,
        qualifier = %qualifier,
        "Generating CloudFormation template"
    );

    let params = KindParams::for_kind(kind);
    let poll_seconds = STATUS_POLL_SECONDS.to_string();

    let substitutions: [(&str, &str); 17] = [
        ("{{GENERATOR}}", GENERATOR_NAME),
        ("{{VERSION}}", GENERATOR_VERSION),
        ("{{DB_IDENTIFIER_SHORT}}", db_identifier_short),
        ("{{DB_IDENTIFIER}}", db_identifier),
        ("{{DB_TYPE}}", kind.as_str()),
        ("{{ARN_TYPE}}", kind.arn_resource_type()),
        ("{{QUALIFIER}}", qualifier),
        ("{{KIND_LABEL}}", params.label),
        ("{{DESCRIBE_ACTION}}", params.describe_action),
        ("{{STOP_ACTION}}", params.stop_action),
        ("{{DESCRIBE_SDK_ACTION}}", params.describe_sdk_action),
        ("{{STOP_SDK_ACTION}}", params.stop_sdk_action),
        ("{{IDENTIFIER_PARAM}}", params.identifier_param),
        ("{{STATUS_PATH}}", params.status_path),
        ("{{EVENT_DETAIL_TYPE}}", params.event_detail_type),
        ("{{EVENT_ID}}", params.event_id),
        ("{{POLL_SECONDS}}", &poll_seconds),
    ];

    let body = substitutions
        .iter()
        .fold(TEMPLATE.to_string(), |acc, (placeholder, value)| {
            acc.replace(placeholder, value)
        });

    debug!("CloudFormation template generated successfully");

    body
}
