mod signing_tests;
