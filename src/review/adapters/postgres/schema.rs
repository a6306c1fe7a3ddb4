//! Diesel schema for reviewer assignment persistence.

diesel::table! {
    /// Development teams.
    teams (id) {
        /// Store-assigned team key.
        id -> Int8,
        /// Unique team name.
        #[max_length = 255]
        name -> Varchar,
    }
}

diesel::table! {
    /// Team members.
    users (id) {
        /// Caller-supplied user identifier.
        #[max_length = 255]
        id -> Varchar,
        /// Display name.
        #[max_length = 255]
        username -> Varchar,
        /// Whether the user may be selected as a reviewer.
        is_active -> Bool,
        /// Owning team.
        team_id -> Int8,
    }
}

diesel::table! {
    /// Pull requests under review.
    pull_requests (id) {
        /// Caller-supplied pull request identifier.
        #[max_length = 255]
        id -> Varchar,
        /// Pull request title.
        #[max_length = 1024]
        title -> Varchar,
        /// Authoring user.
        #[max_length = 255]
        author_id -> Varchar,
        /// Lifecycle state (`OPEN` or `MERGED`).
        #[max_length = 16]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Merge timestamp.
        merged_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Reviewer links between pull requests and users.
    pr_reviewers (id) {
        /// Link key; increasing in assignment order.
        id -> Int8,
        /// Linked pull request.
        #[max_length = 255]
        pr_id -> Varchar,
        /// Linked reviewer.
        #[max_length = 255]
        user_id -> Varchar,
    }
}

diesel::joinable!(users -> teams (team_id));
diesel::joinable!(pull_requests -> users (author_id));
diesel::joinable!(pr_reviewers -> pull_requests (pr_id));
diesel::joinable!(pr_reviewers -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(teams, users, pull_requests, pr_reviewers);
