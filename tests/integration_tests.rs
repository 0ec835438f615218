mod integration {
    mod cli_tests;
    mod delete_tests;
    mod pipeline_tests;
    mod report_tests;
}
