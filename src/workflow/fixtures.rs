//! Shared markdown documents for unit tests.

/// Three steps across three sections, with variable flow from step 0 to step 1.
pub const VALID_WORKFLOW: &str = r#"# Test Workflow

## Discovery Phase

### 🔧 WORKFLOW STEP: Discover repositories
```
Find all repositories in the current project.
```

### 🛠️ TOOL: repository_discovery

### 📤 OUTPUTS:
- result.repositories[0].name → REPO_NAME

### ✅ ASSERT:
- result contains "repositories"
- result.repositories.length > 0

## Setup Phase

### 🔧 WORKFLOW STEP: Set repository context
```
Configure the working context to repository [REPO_NAME]
```

### 🛠️ TOOL: set_repository_context

### 📥 INPUTS:
- REPO_NAME: Repository name from discovery step

### ✅ ASSERT:
- result.success == true

## Action Phase

### 🔧 WORKFLOW STEP: Create pull request
```
Create a PR from feature-branch to main
```

### 🛠️ TOOLS:
- get_current_branch
- create_pull_request

### 📤 OUTPUTS:
- result.pullRequestId → PR_ID

### ✅ ASSERT:
- result.status == "active"
- result.pullRequestId > 0
"#;

/// A single step with one tool and one assertion.
pub const SIMPLE_WORKFLOW: &str = r#"# Simple Workflow

### 🔧 WORKFLOW STEP: Run a single tool
```
Execute the discovery tool and verify results.
```

### 🛠️ TOOL: discovery_tool

### ✅ ASSERT:
- result.success == true
"#;

/// A single step with two assertions and one output.
pub const SINGLE_STEP_WITH_OUTPUT: &str = r#"# Lookup

### 🔧 WORKFLOW STEP: Look up build
```
Find the latest build for the main branch.
```

### 🛠️ TOOL: find_build

### 📤 OUTPUTS:
- result.builds[0].id -> BUILD_ID

### ✅ ASSERT:
- result.builds is not empty
- result.builds[0].status == "succeeded"
"#;

/// A step with no TOOL or TOOLS section.
pub const WORKFLOW_WITHOUT_TOOLS: &str = r#"# Bad Workflow

### 🔧 WORKFLOW STEP: Step with no tool
```
This step has no TOOL section.
```
"#;

/// Markdown without any step headers.
pub const EMPTY_WORKFLOW: &str = r#"# Empty Workflow

This workflow has no executable steps.
"#;
